//! Error types for Clipshelf.
//!
//! This module provides a unified error type for all Clipshelf operations,
//! with specific error variants for different failure modes.
//!
//! Almost nothing in the history engine is allowed to fail loudly: the
//! watcher, the paste controller and the persistence adapter log these errors
//! and carry on. The type exists so that the platform adapters can report
//! *what* went wrong and so the CLI can offer a useful hint.

use thiserror::Error;

/// A specialized `Result` type for Clipshelf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Clipshelf.
#[derive(Error, Debug)]
pub enum Error {
    /// Clipboard access failed
    #[error("clipboard error: {0}")]
    ClipboardError(String),

    /// Image could not be decoded or encoded
    #[error("image error: {0}")]
    ImageError(String),

    /// Focus capture or restoration failed
    #[error("focus error: {0}")]
    FocusError(String),

    /// Synthetic paste keystroke failed
    #[error("paste simulation failed: {0}")]
    PasteFailed(String),

    /// Operation not supported on this platform
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// Pinned entries file could not be read or written
    #[error("pinned storage error: {0}")]
    StorageError(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns whether this error is transient (the next poll may succeed).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ClipboardError(_) | Self::FocusError(_) | Self::PasteFailed(_)
        )
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ClipboardError(_) => Some(
                "Check that a display server is reachable.\n\
                 On Linux, DISPLAY or WAYLAND_DISPLAY must be set.\n\
                 Run 'clipshelf diagnose' for details.",
            ),
            Self::FocusError(_) | Self::PasteFailed(_) => Some(
                "Paste-back needs permission to control other applications.\n\
                 macOS: grant Accessibility access in System Settings > Privacy & Security.\n\
                 Linux (X11): install xdotool.",
            ),
            Self::Unsupported(_) => Some(
                "Disable automatic paste with 'auto_paste = false' under [paste] \
                 and paste manually after selecting an entry.",
            ),
            Self::InvalidConfig { .. } | Self::ConfigError(_) => {
                Some("Reset the configuration with: clipshelf config reset")
            }
            _ => None,
        }
    }
}
