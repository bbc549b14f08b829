//! Clipboard history store.
//!
//! The store is the ordered, bounded, deduplicated list of things the user
//! copied, newest first. It also owns the self-write suppression state that
//! keeps entries pasted *by us* from being captured again.
//!
//! ## Policy
//!
//! - New content goes to the front.
//! - Copying something already present moves it to the front as a fresh,
//!   unpinned entry, unless the existing entry is pinned, in which case the new
//!   copy is dropped.
//! - When the store grows past its capacity the oldest unpinned entries are
//!   evicted. Pinned entries are never evicted.
//!
//! Entry list and suppression state sit behind one lock, because "is this the
//! thing we just wrote?" and "insert it" must happen atomically with respect to
//! the watcher and the paste controller. The lock is never held across I/O.

mod entry;

pub use entry::{ClipContent, EntryKind, HistoryEntry, ImageData};

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::fingerprint::Fingerprint;
use crate::normalize::ImageNormalizer;
use crate::storage::PinnedStorage;

/// Default number of entries kept in history.
pub const DEFAULT_CAPACITY: usize = 30;

/// What an add operation did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New entry placed at the front
    Inserted,
    /// Existing unpinned duplicate removed, fresh entry placed at the front
    MovedToFront,
    /// Content matched our own last clipboard write and was consumed
    Suppressed,
    /// Content duplicates a pinned entry, nothing changed
    BlockedByPinned,
    /// Empty or whitespace-only input, nothing changed
    Ignored,
    /// Pinned entries fill the history, so the new entry was evicted at once.
    /// A removed unpinned duplicate stays removed.
    Evicted,
}

impl AddOutcome {
    /// Whether the content is now at the front of the history.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Inserted | Self::MovedToFront)
    }
}

/// Marker for content this program wrote to the system clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionToken {
    /// Verbatim text that was written
    Text(String),
    /// Fingerprint of the image bytes that were written
    Image(Fingerprint),
}

impl SuppressionToken {
    /// Token matching what the watcher will read back after `content` is written.
    #[must_use]
    pub fn for_content(content: &ClipContent) -> Self {
        match content {
            ClipContent::Text(text) => Self::Text(text.clone()),
            ClipContent::Image(image) => Self::Image(image.fingerprint()),
        }
    }
}

#[derive(Debug, Default)]
struct SelfWrite {
    token: Option<SuppressionToken>,
    change_count: Option<u64>,
    written_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: Vec<HistoryEntry>,
    self_write: SelfWrite,
}

impl HistoryState {
    /// Consume the suppression token if `matches` accepts it.
    fn take_token_if(&mut self, matches: impl FnOnce(&SuppressionToken) -> bool) -> bool {
        if self.self_write.token.as_ref().is_some_and(matches) {
            self.self_write.token = None;
            true
        } else {
            false
        }
    }
}

/// Bounded clipboard history shared by the watcher and the paste controller.
#[derive(Debug)]
pub struct HistoryStore {
    state: Mutex<HistoryState>,
    capacity: usize,
    normalizer: ImageNormalizer,
    storage: Option<PinnedStorage>,
    /// Serializes saves so the newest snapshot is always written last.
    save_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create an empty store without persistence.
    #[must_use]
    pub fn new(capacity: usize, normalizer: ImageNormalizer) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            capacity,
            normalizer,
            storage: None,
            save_lock: Mutex::new(()),
        }
    }

    /// Create an empty store sized by the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.history.capacity,
            ImageNormalizer::new(config.image.max_dimension),
        )
    }

    /// Persist pinned entries to `storage` whenever they change.
    #[must_use]
    pub fn with_storage(mut self, storage: PinnedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Maximum number of entries kept under capacity pressure.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record copied text.
    ///
    /// Leading and trailing whitespace is trimmed; blank input is ignored. If
    /// the text equals our own last clipboard write, the suppression token is
    /// consumed and history is left untouched.
    pub fn add_text(&self, text: &str) -> AddOutcome {
        let text = text.trim();
        if text.is_empty() {
            return AddOutcome::Ignored;
        }

        let mut state = self.lock();
        if state.take_token_if(|token| matches!(token, SuppressionToken::Text(t) if t == text)) {
            tracing::debug!("Skipping text we just pasted");
            return AddOutcome::Suppressed;
        }

        let outcome = self.insert_locked(&mut state, ClipContent::Text(text.to_string()));
        drop(state);

        if outcome.changed() {
            tracing::debug!(chars = text.chars().count(), ?outcome, "Recorded text");
        }
        outcome
    }

    /// Record a copied image.
    ///
    /// The image is normalized first (outside the lock) and identified by the
    /// fingerprint of the normalized bytes, so copies that normalize to the
    /// same pixels deduplicate even when their originals differ in size.
    pub fn add_image(&self, data: &[u8]) -> AddOutcome {
        if data.is_empty() {
            return AddOutcome::Ignored;
        }

        let normalized = match self.normalizer.normalize(data) {
            Ok(bytes) => bytes.into_owned(),
            Err(e) => {
                tracing::warn!("Failed to resize image, storing original: {}", e);
                data.to_vec()
            }
        };
        let normalized_len = normalized.len();
        let image = ImageData::new(normalized);
        let fingerprint = image.fingerprint();

        let mut state = self.lock();
        if state.take_token_if(|token| *token == SuppressionToken::Image(fingerprint)) {
            tracing::debug!(%fingerprint, "Skipping image we just pasted");
            return AddOutcome::Suppressed;
        }

        let outcome = self.insert_locked(&mut state, ClipContent::Image(image));
        drop(state);

        if outcome.changed() {
            let original_kb = data.len() / 1024;
            let stored_kb = normalized_len / 1024;
            if original_kb > stored_kb {
                tracing::info!("Image resized: {}KB -> {}KB", original_kb, stored_kb);
            }
        }
        outcome
    }

    /// Dedup, insert at the front and trim. Caller holds the lock.
    fn insert_locked(&self, state: &mut HistoryState, content: ClipContent) -> AddOutcome {
        let mut outcome = AddOutcome::Inserted;

        if let Some(pos) = state.entries.iter().position(|e| e.content.same_as(&content)) {
            if state.entries[pos].pinned {
                return AddOutcome::BlockedByPinned;
            }
            state.entries.remove(pos);
            outcome = AddOutcome::MovedToFront;
        }

        state.entries.insert(0, HistoryEntry::new(content));

        if state.entries.len() > self.capacity {
            let entries = std::mem::take(&mut state.entries);
            state.entries = trim_to_capacity(entries, self.capacity);

            // Trimming keeps surviving unpinned entries in front, newest first,
            // so the new entry survived only if the front entry is unpinned.
            if state.entries.first().is_none_or(|e| e.pinned) {
                tracing::debug!("History full of pinned entries, new entry evicted");
                return AddOutcome::Evicted;
            }
        }

        outcome
    }

    /// Snapshot of the history, newest first.
    #[must_use]
    pub fn get(&self) -> Vec<HistoryEntry> {
        self.lock().entries.clone()
    }

    /// Snapshot of a single entry.
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<HistoryEntry> {
        self.lock().entries.get(index).cloned()
    }

    /// Pinned entries in history order.
    #[must_use]
    pub fn pinned(&self) -> Vec<HistoryEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.pinned)
            .cloned()
            .collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Flip the pinned flag of an entry and persist pinned entries.
    ///
    /// Returns the new pinned state, or `None` (logged) if `index` is out of range.
    pub fn toggle_pin(&self, index: usize) -> Option<bool> {
        let pinned = {
            let mut state = self.lock();
            let len = state.entries.len();
            let Some(entry) = state.entries.get_mut(index) else {
                tracing::warn!("toggle_pin: invalid index {} (history has {})", index, len);
                return None;
            };
            entry.pinned = !entry.pinned;
            entry.pinned
        };

        self.persist_pinned();
        Some(pinned)
    }

    /// Remove an entry. Pinned entries are re-persisted after removal.
    ///
    /// Returns the removed entry, or `None` (logged) if `index` is out of range.
    pub fn delete(&self, index: usize) -> Option<HistoryEntry> {
        let removed = {
            let mut state = self.lock();
            if index >= state.entries.len() {
                tracing::warn!(
                    "delete: invalid index {} (history has {})",
                    index,
                    state.entries.len()
                );
                return None;
            }
            state.entries.remove(index)
        };

        if removed.pinned {
            self.persist_pinned();
        }
        Some(removed)
    }

    /// Append restored entries as pinned, in order, bypassing dedup.
    ///
    /// Returns the number of entries appended.
    pub fn load_pinned(&self, entries: Vec<HistoryEntry>) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state
            .entries
            .extend(entries.into_iter().map(|e| HistoryEntry::pinned(e.content)));
        state.entries.len() - before
    }

    /// Load pinned entries from the configured storage.
    ///
    /// Returns the number of entries restored (zero without storage).
    pub fn restore(&self) -> usize {
        let Some(storage) = &self.storage else {
            return 0;
        };
        let count = self.load_pinned(storage.load());
        tracing::info!("Loaded {} pinned items", count);
        count
    }

    /// Validate `index` and arm self-write suppression for it, atomically.
    ///
    /// Returns the content the caller must now write to the system clipboard.
    /// `change_count` is the counter value read just before this call.
    pub fn prepare_write(&self, index: usize, change_count: Option<u64>) -> Option<ClipContent> {
        let mut state = self.lock();
        let Some(entry) = state.entries.get(index) else {
            tracing::warn!(
                "select: invalid index {} (history has {})",
                index,
                state.entries.len()
            );
            return None;
        };

        let content = entry.content.clone();
        state.self_write = SelfWrite {
            token: Some(SuppressionToken::for_content(&content)),
            change_count,
            written_at: Some(Instant::now()),
        };
        Some(content)
    }

    /// Arm self-write suppression for content written outside the history.
    pub fn arm_self_write(&self, token: SuppressionToken, change_count: Option<u64>) {
        self.lock().self_write = SelfWrite {
            token: Some(token),
            change_count,
            written_at: Some(Instant::now()),
        };
    }

    /// Forget the armed suppression (used when the clipboard write failed).
    pub fn disarm_self_write(&self) {
        self.lock().self_write = SelfWrite::default();
    }

    /// Whether the armed token is still waiting to be consumed.
    #[must_use]
    pub fn pending_suppression(&self) -> Option<SuppressionToken> {
        self.lock().self_write.token.clone()
    }

    /// Whether a clipboard change should be attributed to our own write.
    ///
    /// True if `change_count` equals the counter captured at our last write, or
    /// if that write happened less than `grace` ago.
    #[must_use]
    pub fn is_self_write(&self, change_count: u64, grace: Duration) -> bool {
        let state = self.lock();
        let write = &state.self_write;
        write.change_count == Some(change_count)
            || write.written_at.is_some_and(|at| at.elapsed() < grace)
    }

    fn persist_pinned(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let pinned = self.pinned();
        storage.save(&pinned);
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        // Every mutation leaves the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, ImageNormalizer::default())
    }
}

/// Reduce `entries` to `capacity`, evicting the oldest unpinned entries.
///
/// The result is the most recent unpinned entries that fit next to the pinned
/// ones, followed by every pinned entry, each group in its original order.
/// Pinned entries therefore move behind the surviving unpinned ones. If the
/// pinned entries alone fill the capacity, only they remain.
#[must_use]
pub fn trim_to_capacity(entries: Vec<HistoryEntry>, capacity: usize) -> Vec<HistoryEntry> {
    if entries.len() <= capacity {
        return entries;
    }

    let (pinned, mut unpinned): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.pinned);
    let room = capacity.saturating_sub(pinned.len());
    if room == 0 {
        return pinned;
    }

    unpinned.truncate(room);
    unpinned.extend(pinned);
    unpinned
}
