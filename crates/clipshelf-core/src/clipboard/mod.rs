//! System clipboard access and change detection.
//!
//! This module provides:
//!
//! - [`SystemClipboard`], the narrow interface the history engine needs from
//!   the operating system clipboard
//! - [`NativeClipboard`], the cross-platform implementation built on `arboard`
//! - [`ClipboardWatcher`], the polling loop that feeds new clipboard content
//!   into the [`HistoryStore`](crate::history::HistoryStore)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Arc::new(HistoryStore::from_config(&config));
//! let clipboard: Arc<dyn SystemClipboard> = Arc::new(NativeClipboard::new()?);
//!
//! let (mut changes, handle) = ClipboardWatcher::with_config(config.watcher)
//!     .start(Arc::clone(&store), clipboard);
//! while let Some(change) = changes.recv().await {
//!     println!("{} captured", change.kind);
//! }
//! handle.stop().await;
//! ```

pub mod access;
pub mod watcher;

pub use access::{create_clipboard, diagnose_clipboard, NativeClipboard};
pub use watcher::{ClipboardChange, ClipboardWatcher, PollOutcome, WatchState, WatcherHandle};

use crate::error::Result;
use crate::history::ClipContent;

/// Operating system clipboard, as seen by the history engine.
///
/// Implementations must be cheap to share between the watcher task and the
/// paste controller, hence `&self` receivers.
pub trait SystemClipboard: Send + Sync {
    /// Counter that changes whenever the clipboard content changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be queried.
    fn change_count(&self) -> Result<u64>;

    /// Current image content, encoded (PNG), if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be read.
    fn read_image(&self) -> Result<Option<Vec<u8>>>;

    /// Current text content, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be read.
    fn read_text(&self) -> Result<Option<String>>;

    /// Replace the clipboard content with text.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be written.
    fn write_text(&self, text: &str) -> Result<()>;

    /// Replace the clipboard content with an encoded image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded or the clipboard written.
    fn write_image(&self, data: &[u8]) -> Result<()>;

    /// Replace the clipboard content with a history entry's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be written.
    fn write(&self, content: &ClipContent) -> Result<()> {
        match content {
            ClipContent::Text(text) => self.write_text(text),
            ClipContent::Image(image) => self.write_image(image.bytes()),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory clipboard for unit tests.

    use std::sync::{Mutex, PoisonError};

    use super::SystemClipboard;
    use crate::error::{Error, Result};

    #[derive(Debug, Default)]
    struct MockState {
        count: u64,
        text: Option<String>,
        image: Option<Vec<u8>>,
        fail_reads: bool,
        fail_image_reads: bool,
        writes: Vec<String>,
    }

    /// Clipboard whose counter bumps on every content change.
    #[derive(Debug, Default)]
    pub struct MockClipboard {
        state: Mutex<MockState>,
    }

    impl MockClipboard {
        pub fn copy_text(&self, text: &str) {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.count += 1;
            state.text = Some(text.to_string());
            state.image = None;
        }

        pub fn copy_image(&self, data: &[u8]) {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.count += 1;
            state.image = Some(data.to_vec());
            state.text = None;
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fail_reads = fail;
        }

        pub fn set_fail_image_reads(&self, fail: bool) {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fail_image_reads = fail;
        }

        pub fn writes(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .writes
                .clone()
        }
    }

    impl SystemClipboard for MockClipboard {
        fn change_count(&self) -> Result<u64> {
            Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner).count)
        }

        fn read_image(&self) -> Result<Option<Vec<u8>>> {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.fail_reads {
                return Err(Error::ClipboardError("clipboard busy".to_string()));
            }
            if state.fail_image_reads {
                return Err(Error::ImageError("unsupported image format".to_string()));
            }
            Ok(state.image.clone())
        }

        fn read_text(&self) -> Result<Option<String>> {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.fail_reads {
                return Err(Error::ClipboardError("clipboard busy".to_string()));
            }
            Ok(state.text.clone())
        }

        fn write_text(&self, text: &str) -> Result<()> {
            self.copy_text(text);
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .writes
                .push(text.to_string());
            Ok(())
        }

        fn write_image(&self, data: &[u8]) -> Result<()> {
            self.copy_image(data);
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .writes
                .push(format!("<image {} bytes>", data.len()));
            Ok(())
        }
    }
}
