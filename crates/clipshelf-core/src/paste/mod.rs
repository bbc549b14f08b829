//! Paste-back of history entries.
//!
//! [`PasteController::select`] is what happens when the user picks an entry:
//!
//! 1. The entry is looked up and self-write suppression is armed, atomically,
//!    so the watcher cannot observe the write before it knows to ignore it.
//! 2. The entry is written to the system clipboard.
//! 3. The picker is hidden.
//! 4. In the background, after short settle delays, focus goes back to the
//!    application remembered by [`PasteController::remember_focus`] and a paste
//!    keystroke is sent to it.
//!
//! Steps 2 to 4 run outside the store lock. Failures in step 4 are logged only.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tokio::task::JoinHandle;

use crate::clipboard::SystemClipboard;
use crate::config::PasteConfig;
use crate::focus::{FocusControl, FocusTarget, Presenter};
use crate::history::HistoryStore;

/// Writes chosen entries back to the clipboard and pastes them.
pub struct PasteController {
    store: Arc<HistoryStore>,
    clipboard: Arc<dyn SystemClipboard>,
    focus: Arc<dyn FocusControl>,
    presenter: Arc<dyn Presenter>,
    previous: Arc<Mutex<Option<FocusTarget>>>,
    config: PasteConfig,
}

impl std::fmt::Debug for PasteController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasteController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PasteController {
    /// Create a controller.
    #[must_use]
    pub fn new(
        store: Arc<HistoryStore>,
        clipboard: Arc<dyn SystemClipboard>,
        focus: Arc<dyn FocusControl>,
        presenter: Arc<dyn Presenter>,
        config: PasteConfig,
    ) -> Self {
        Self {
            store,
            clipboard,
            focus,
            presenter,
            previous: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// The shared history.
    #[must_use]
    pub const fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// Record the currently focused application, to return to after a pick.
    ///
    /// Call this just before showing the picker.
    pub fn remember_focus(&self) -> Option<FocusTarget> {
        let target = self.focus.capture_focused();
        tracing::debug!(focus = ?target, "Remembered focused application");
        *self.previous.lock().unwrap_or_else(PoisonError::into_inner) = target.clone();
        target
    }

    /// Paste the entry at `index` into the previously focused application.
    ///
    /// Returns `None` without side effects if `index` is out of range, and
    /// `None` (after disarming suppression) if the clipboard write fails.
    /// Otherwise returns the handle of the background focus-and-paste task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn select(&self, index: usize) -> Option<JoinHandle<()>> {
        let change_count = match self.clipboard.change_count() {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::debug!("select: change count unavailable: {}", e);
                None
            }
        };

        let content = self.store.prepare_write(index, change_count)?;

        if let Err(e) = self.clipboard.write(&content) {
            self.store.disarm_self_write();
            tracing::warn!("select: failed to write {} to clipboard: {}", content.kind(), e);
            return None;
        }
        tracing::debug!(index, kind = %content.kind(), "Wrote entry to clipboard");

        self.presenter.hide();
        Some(self.spawn_refocus(self.config.auto_paste))
    }

    /// Hide the picker and return focus without pasting.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dismiss(&self) -> JoinHandle<()> {
        self.presenter.hide();
        self.spawn_refocus(false)
    }

    fn spawn_refocus(&self, paste: bool) -> JoinHandle<()> {
        let focus = Arc::clone(&self.focus);
        let previous = Arc::clone(&self.previous);
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            thread::sleep(config.focus_delay);

            let target = previous
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(target) = target {
                if let Err(e) = focus.restore_focus(&target) {
                    tracing::warn!("restore focus to {} failed: {}", target, e);
                }
            }

            if paste {
                thread::sleep(config.paste_delay);
                if let Err(e) = focus.simulate_paste() {
                    tracing::warn!("simulate paste failed: {}", e);
                }
            }
        })
    }
}
