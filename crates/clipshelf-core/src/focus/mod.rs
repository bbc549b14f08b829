//! Focus restoration and synthetic paste.
//!
//! Picking an entry hands focus back to the application that was frontmost
//! before the picker appeared and then sends it a paste keystroke. Both are
//! done by shelling out to the platform's automation tool:
//!
//! | Platform | Tool | Focus target |
//! |----------|------|--------------|
//! | macOS | `osascript` (System Events) | process id |
//! | Linux (X11) | `xdotool` | window id |
//!
//! Other platforms report [`Error::Unsupported`].

use std::fmt;
use std::process::Command;

use crate::error::{Error, Result};

/// Opaque handle to the application or window that had focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget(String);

impl FocusTarget {
    /// Wrap a numeric platform identifier (process id or window id).
    ///
    /// Returns `None` for anything that is not a plain unsigned number, since
    /// the value ends up inside an automation script.
    #[must_use]
    pub fn new(id: &str) -> Option<Self> {
        let id = id.trim();
        (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then(|| Self(id.to_string()))
    }

    /// The platform identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FocusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Desktop automation needed for paste-back.
pub trait FocusControl: Send + Sync {
    /// The currently focused application, if it can be determined.
    fn capture_focused(&self) -> Option<FocusTarget>;

    /// Bring `target` back to the front.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform tool fails or is unavailable.
    fn restore_focus(&self, target: &FocusTarget) -> Result<()>;

    /// Send a paste keystroke to the focused application.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform tool fails or is unavailable.
    fn simulate_paste(&self) -> Result<()>;
}

/// The surface that lists history to the user.
pub trait Presenter: Send + Sync {
    /// Hide the picker so focus can return to the previous application.
    fn hide(&self);
}

/// [`FocusControl`] backed by the platform automation tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFocus;

impl SystemFocus {
    /// Create the platform focus controller.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl FocusControl for SystemFocus {
    fn capture_focused(&self) -> Option<FocusTarget> {
        let script = r#"tell application "System Events" to get unix id of first process whose frontmost is true"#;
        match run_tool("osascript", &["-e", script]) {
            Ok(out) => FocusTarget::new(&out),
            Err(e) => {
                tracing::warn!("capture focus failed: {}", e);
                None
            }
        }
    }

    fn restore_focus(&self, target: &FocusTarget) -> Result<()> {
        let script = format!(
            r#"tell application "System Events" to set frontmost of (first process whose unix id is {}) to true"#,
            target.id()
        );
        run_tool("osascript", &["-e", &script]).map(drop)
    }

    fn simulate_paste(&self) -> Result<()> {
        let script = r#"tell application "System Events" to keystroke "v" using command down"#;
        run_tool("osascript", &["-e", script])
            .map(drop)
            .map_err(|e| Error::PasteFailed(e.to_string()))
    }
}

#[cfg(target_os = "linux")]
impl FocusControl for SystemFocus {
    fn capture_focused(&self) -> Option<FocusTarget> {
        match run_tool("xdotool", &["getactivewindow"]) {
            Ok(out) => FocusTarget::new(&out),
            Err(e) => {
                tracing::warn!("capture focus failed: {}", e);
                None
            }
        }
    }

    fn restore_focus(&self, target: &FocusTarget) -> Result<()> {
        run_tool("xdotool", &["windowactivate", "--sync", target.id()]).map(drop)
    }

    fn simulate_paste(&self) -> Result<()> {
        run_tool("xdotool", &["key", "--clearmodifiers", "ctrl+v"])
            .map(drop)
            .map_err(|e| Error::PasteFailed(e.to_string()))
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
impl FocusControl for SystemFocus {
    fn capture_focused(&self) -> Option<FocusTarget> {
        None
    }

    fn restore_focus(&self, _target: &FocusTarget) -> Result<()> {
        Err(Error::Unsupported("focus restoration"))
    }

    fn simulate_paste(&self) -> Result<()> {
        Err(Error::Unsupported("synthetic paste"))
    }
}

/// Run an automation tool and return its trimmed stdout.
#[cfg(any(target_os = "macos", target_os = "linux"))]
fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::FocusError(format!("failed to execute {program}: {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::FocusError(format!("{program} failed: {}", stderr.trim())))
    }
}

/// Whether the platform automation tool can be found.
#[must_use]
pub fn automation_available() -> bool {
    #[cfg(target_os = "macos")]
    let program = Some("osascript");
    #[cfg(target_os = "linux")]
    let program = Some("xdotool");
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    let program: Option<&str> = None;

    program.is_some_and(|program| Command::new(program).arg("--version").output().is_ok())
}
