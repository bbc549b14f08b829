//! Clipboard change detection.
//!
//! There is no universal clipboard change notification API, so the watcher
//! polls the clipboard's change counter and only reads content when the counter
//! moves. Polling is adaptive: [`WatcherConfig::active_interval`] while the
//! clipboard is busy, [`WatcherConfig::idle_interval`] once it has been quiet
//! for [`WatcherConfig::idle_after`].

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::WatcherConfig;
use crate::error::Error;
use crate::fingerprint::Fingerprint;
use crate::history::{AddOutcome, EntryKind, HistoryStore};

use super::SystemClipboard;

/// Notification that the watcher changed the history.
#[derive(Debug, Clone)]
pub struct ClipboardChange {
    /// Kind of content captured
    pub kind: EntryKind,
    /// What the store did with it
    pub outcome: AddOutcome,
    /// When the change was detected
    pub timestamp: SystemTime,
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Counter did not move
    Unchanged,
    /// Change attributed to our own clipboard write
    SelfWrite,
    /// Clipboard holds neither image nor text
    Empty,
    /// Same content as the previous capture; our own pastes never count as one
    Repeated,
    /// Content handed to the store
    Captured {
        /// Kind of content
        kind: EntryKind,
        /// What the store did with it
        outcome: AddOutcome,
    },
    /// Clipboard could not be read; retried on the next tick
    ReadFailed,
}

/// Polling state carried between ticks.
#[derive(Debug)]
pub struct WatchState {
    config: WatcherConfig,
    last_count: u64,
    last_image: Option<Fingerprint>,
    last_text: Option<String>,
    idle_ticks: u64,
}

impl WatchState {
    /// Fresh state; `initial_count` is the counter value at startup, whose
    /// content is treated as already seen.
    #[must_use]
    pub const fn new(config: WatcherConfig, initial_count: u64) -> Self {
        Self {
            config,
            last_count: initial_count,
            last_image: None,
            last_text: None,
            idle_ticks: 0,
        }
    }

    /// Number of quiet ticks before switching to the idle interval.
    fn idle_threshold(&self) -> u64 {
        let active = self.config.active_interval.as_millis().max(1);
        u64::try_from(self.config.idle_after.as_millis() / active).unwrap_or(u64::MAX)
    }

    /// Delay before the next poll.
    #[must_use]
    pub fn next_interval(&self) -> Duration {
        if self.idle_ticks < self.idle_threshold() {
            self.config.active_interval
        } else {
            self.config.idle_interval
        }
    }

    /// Whether the watcher has backed off to the idle interval.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle_ticks >= self.idle_threshold()
    }

    /// Check the clipboard once and feed any new content into `store`.
    pub fn poll(&mut self, store: &HistoryStore, clipboard: &dyn SystemClipboard) -> PollOutcome {
        let count = match clipboard.change_count() {
            Ok(count) => count,
            Err(e) => {
                log_read_error("change count", &e);
                self.idle_ticks = self.idle_ticks.saturating_add(1);
                return PollOutcome::ReadFailed;
            }
        };

        if count == self.last_count {
            self.idle_ticks = self.idle_ticks.saturating_add(1);
            return PollOutcome::Unchanged;
        }

        if store.is_self_write(count, self.config.self_write_grace) {
            tracing::trace!(count, "Clipboard change caused by our own write");
            self.last_count = count;
            self.idle_ticks = 0;
            return PollOutcome::SelfWrite;
        }

        // An unreadable image (unsupported format, conversion failure) is
        // treated as no image so text copied alongside it is still captured.
        let image = match clipboard.read_image() {
            Ok(image) => image.filter(|data| !data.is_empty()),
            Err(e) => {
                log_read_error("image", &e);
                None
            }
        };

        if let Some(data) = image {
            self.last_count = count;
            self.idle_ticks = 0;
            let fingerprint = Fingerprint::of(&data);
            if self.last_image == Some(fingerprint) {
                return PollOutcome::Repeated;
            }

            let outcome = store.add_image(&data);
            if outcome != AddOutcome::Suppressed {
                self.last_image = Some(fingerprint);
                tracing::info!("Captured image ({} bytes)", data.len());
            }
            return PollOutcome::Captured {
                kind: EntryKind::Image,
                outcome,
            };
        }

        let text = match clipboard.read_text() {
            Ok(text) => text.filter(|t| !t.is_empty()),
            Err(e) => {
                log_read_error("text", &e);
                // Keep counting quiet ticks so a clipboard that never becomes
                // readable still backs off to the idle interval.
                self.idle_ticks = self.idle_ticks.saturating_add(1);
                return PollOutcome::ReadFailed;
            }
        };

        self.last_count = count;
        self.idle_ticks = 0;
        let Some(text) = text else {
            return PollOutcome::Empty;
        };
        if self.last_text.as_deref() == Some(text.as_str()) {
            return PollOutcome::Repeated;
        }

        let outcome = store.add_text(&text);
        if outcome != AddOutcome::Suppressed {
            tracing::info!("Captured {} chars", text.chars().count());
            self.last_text = Some(text);
        }
        PollOutcome::Captured {
            kind: EntryKind::Text,
            outcome,
        }
    }
}

/// Transient failures are expected while another app owns the clipboard.
fn log_read_error(what: &str, error: &Error) {
    if error.is_recoverable() {
        tracing::debug!("Clipboard: failed to read {}: {}", what, error);
    } else {
        tracing::warn!("Clipboard: failed to read {}: {}", what, error);
    }
}

/// Watches the system clipboard and records new content in a [`HistoryStore`].
#[derive(Debug, Clone, Default)]
pub struct ClipboardWatcher {
    config: WatcherConfig,
}

impl ClipboardWatcher {
    /// Create a watcher with custom intervals.
    #[must_use]
    pub const fn with_config(config: WatcherConfig) -> Self {
        Self { config }
    }

    /// Start watching.
    ///
    /// Content already on the clipboard at startup is not captured. Returns a
    /// receiver of capture notifications and a handle to stop the task. The
    /// notifications are best-effort: if the receiver lags or is dropped, the
    /// watcher keeps recording into the store.
    pub fn start(
        &self,
        store: Arc<HistoryStore>,
        clipboard: Arc<dyn SystemClipboard>,
    ) -> (mpsc::Receiver<ClipboardChange>, WatcherHandle) {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            let initial = clipboard.change_count().unwrap_or_else(|e| {
                tracing::warn!("Clipboard: failed to read initial change count: {}", e);
                0
            });
            let mut state = WatchState::new(config, initial);
            tracing::info!("Clipboard watcher started");

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        tracing::debug!("Clipboard watcher stopping");
                        break;
                    }
                    () = tokio::time::sleep(state.next_interval()) => {
                        if let PollOutcome::Captured { kind, outcome } =
                            state.poll(&store, clipboard.as_ref())
                        {
                            if !outcome.changed() {
                                continue;
                            }
                            let change = ClipboardChange {
                                kind,
                                outcome,
                                timestamp: SystemTime::now(),
                            };
                            if tx.try_send(change).is_err() {
                                tracing::trace!("Clipboard change notification dropped");
                            }
                        }
                    }
                }
            }
        });

        (rx, WatcherHandle { stop_tx, task })
    }
}

/// Handle to stop the clipboard watcher.
#[derive(Debug)]
pub struct WatcherHandle {
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Whether the watcher task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the watcher and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::warn!("Clipboard watcher task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::mock::MockClipboard;
    use crate::history::SuppressionToken;

    fn config() -> WatcherConfig {
        WatcherConfig {
            active_interval: Duration::from_millis(10),
            idle_interval: Duration::from_millis(50),
            idle_after: Duration::from_millis(30),
            self_write_grace: Duration::ZERO,
        }
    }

    #[test]
    fn test_unchanged_counter_skips_reads() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        assert_eq!(state.poll(&store, &clipboard), PollOutcome::Unchanged);
        assert!(store.is_empty());
    }

    #[test]
    fn test_captures_text() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_text("hello");
        assert_eq!(
            state.poll(&store, &clipboard),
            PollOutcome::Captured {
                kind: EntryKind::Text,
                outcome: AddOutcome::Inserted,
            }
        );
        assert_eq!(store.get()[0].text(), Some("hello"));
    }

    #[test]
    fn test_repeated_text_is_skipped() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_text("same");
        state.poll(&store, &clipboard);
        clipboard.copy_text("same");
        assert_eq!(state.poll(&store, &clipboard), PollOutcome::Repeated);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_image_preferred_and_repeats_skipped() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_image(b"not really a png");
        assert!(matches!(
            state.poll(&store, &clipboard),
            PollOutcome::Captured {
                kind: EntryKind::Image,
                ..
            }
        ));

        clipboard.copy_image(b"not really a png");
        assert_eq!(state.poll(&store, &clipboard), PollOutcome::Repeated);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_self_write_by_counter() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_text("ours");
        store.arm_self_write(SuppressionToken::Text("ours".to_string()), Some(1));

        assert_eq!(state.poll(&store, &clipboard), PollOutcome::SelfWrite);
        assert!(store.is_empty());
        assert_eq!(state.poll(&store, &clipboard), PollOutcome::Unchanged);
    }

    #[test]
    fn test_self_write_within_grace() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(
            WatcherConfig {
                self_write_grace: Duration::from_secs(60),
                ..config()
            },
            0,
        );

        store.arm_self_write(SuppressionToken::Text("ours".to_string()), None);
        clipboard.copy_text("external");
        assert_eq!(state.poll(&store, &clipboard), PollOutcome::SelfWrite);
        assert!(store.is_empty());
    }

    #[test]
    fn test_read_failure_retries_next_tick() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_text("later");
        clipboard.set_fail_reads(true);
        assert_eq!(state.poll(&store, &clipboard), PollOutcome::ReadFailed);

        clipboard.set_fail_reads(false);
        assert!(matches!(
            state.poll(&store, &clipboard),
            PollOutcome::Captured { .. }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unreadable_image_falls_back_to_text() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_text("copied text");
        clipboard.set_fail_image_reads(true);
        assert_eq!(
            state.poll(&store, &clipboard),
            PollOutcome::Captured {
                kind: EntryKind::Text,
                outcome: AddOutcome::Inserted,
            }
        );
        assert_eq!(store.get()[0].text(), Some("copied text"));
        assert_eq!(state.poll(&store, &clipboard), PollOutcome::Unchanged);
    }

    #[test]
    fn test_persistent_read_failure_backs_off() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        clipboard.copy_text("unreadable");
        clipboard.set_fail_reads(true);
        for _ in 0..3 {
            assert_eq!(state.poll(&store, &clipboard), PollOutcome::ReadFailed);
        }
        assert!(state.is_idle());
        assert!(store.is_empty());
    }

    #[test]
    fn test_idle_backoff() {
        let store = HistoryStore::default();
        let clipboard = MockClipboard::default();
        let mut state = WatchState::new(config(), 0);

        assert_eq!(state.next_interval(), Duration::from_millis(10));
        for _ in 0..3 {
            state.poll(&store, &clipboard);
        }
        assert!(state.is_idle());
        assert_eq!(state.next_interval(), Duration::from_millis(50));

        clipboard.copy_text("wake up");
        state.poll(&store, &clipboard);
        assert!(!state.is_idle());
        assert_eq!(state.next_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_default_idle_threshold() {
        let state = WatchState::new(WatcherConfig::default(), 0);
        assert_eq!(state.idle_threshold(), 25);
    }

    #[tokio::test]
    async fn test_watcher_detects_change() {
        let store = Arc::new(HistoryStore::default());
        let clipboard = Arc::new(MockClipboard::default());

        let (mut rx, handle) = ClipboardWatcher::with_config(config())
            .start(Arc::clone(&store), Arc::clone(&clipboard) as Arc<dyn SystemClipboard>);

        tokio::time::sleep(Duration::from_millis(30)).await;
        clipboard.copy_text("Test content");

        let change = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("watcher should report the change")
            .expect("channel open");
        assert_eq!(change.kind, EntryKind::Text);
        assert_eq!(store.get()[0].text(), Some("Test content"));

        assert!(handle.is_running());
        handle.stop().await;
    }
}
