//! Common test utilities for `Clipshelf` integration tests.
//!
//! Provides an in-memory clipboard, recording focus and presenter doubles, and
//! image fixtures.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clipshelf_core::clipboard::SystemClipboard;
use clipshelf_core::config::{PasteConfig, WatcherConfig};
use clipshelf_core::focus::{FocusControl, FocusTarget, Presenter};
use clipshelf_core::history::HistoryStore;
use clipshelf_core::paste::PasteController;
use clipshelf_core::Result;

/// Create a temporary directory for test files.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Encode a solid-colour PNG of the given size.
pub fn png_of_size(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 120, 200, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

#[derive(Debug, Default)]
struct Contents {
    count: u64,
    text: Option<String>,
    image: Option<Vec<u8>>,
}

/// Clipboard held in memory; every content change bumps the counter.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Contents>,
    writes: AtomicUsize,
}

impl MemoryClipboard {
    /// Simulate another application copying text.
    pub fn copy_text(&self, text: &str) {
        let mut contents = self.contents.lock().unwrap();
        contents.count += 1;
        contents.text = Some(text.to_string());
        contents.image = None;
    }

    /// Simulate another application copying an image.
    pub fn copy_image(&self, data: &[u8]) {
        let mut contents = self.contents.lock().unwrap();
        contents.count += 1;
        contents.image = Some(data.to_vec());
        contents.text = None;
    }

    /// Number of writes made through [`SystemClipboard`].
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current text content.
    pub fn text(&self) -> Option<String> {
        self.contents.lock().unwrap().text.clone()
    }
}

impl SystemClipboard for MemoryClipboard {
    fn change_count(&self) -> Result<u64> {
        Ok(self.contents.lock().unwrap().count)
    }

    fn read_image(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.contents.lock().unwrap().image.clone())
    }

    fn read_text(&self) -> Result<Option<String>> {
        Ok(self.contents.lock().unwrap().text.clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.copy_text(text);
        Ok(())
    }

    fn write_image(&self, data: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.copy_image(data);
        Ok(())
    }
}

/// Focus control that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingFocus {
    events: Mutex<Vec<String>>,
}

impl RecordingFocus {
    /// Recorded actions, in order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl FocusControl for RecordingFocus {
    fn capture_focused(&self) -> Option<FocusTarget> {
        FocusTarget::new("1001")
    }

    fn restore_focus(&self, target: &FocusTarget) -> Result<()> {
        self.events.lock().unwrap().push(format!("restore {target}"));
        Ok(())
    }

    fn simulate_paste(&self) -> Result<()> {
        self.events.lock().unwrap().push("paste".to_string());
        Ok(())
    }
}

/// Presenter that counts how often it was hidden.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    hidden: AtomicUsize,
}

impl RecordingPresenter {
    /// Number of hide calls.
    pub fn hidden(&self) -> usize {
        self.hidden.load(Ordering::SeqCst)
    }
}

impl Presenter for RecordingPresenter {
    fn hide(&self) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}

/// Watcher settings for tests: fast polling, no time-based suppression.
pub fn fast_watcher_config() -> WatcherConfig {
    WatcherConfig {
        active_interval: Duration::from_millis(10),
        idle_interval: Duration::from_millis(20),
        idle_after: Duration::from_millis(100),
        self_write_grace: Duration::ZERO,
    }
}

/// Everything needed to drive a select-and-paste flow.
pub struct Harness {
    pub store: Arc<HistoryStore>,
    pub clipboard: Arc<MemoryClipboard>,
    pub focus: Arc<RecordingFocus>,
    pub presenter: Arc<RecordingPresenter>,
    pub controller: PasteController,
}

impl Harness {
    pub fn new(store: HistoryStore) -> Self {
        let store = Arc::new(store);
        let clipboard = Arc::new(MemoryClipboard::default());
        let focus = Arc::new(RecordingFocus::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let controller = PasteController::new(
            Arc::clone(&store),
            Arc::clone(&clipboard) as Arc<dyn SystemClipboard>,
            Arc::clone(&focus) as Arc<dyn FocusControl>,
            Arc::clone(&presenter) as Arc<dyn Presenter>,
            PasteConfig {
                auto_paste: true,
                focus_delay: Duration::ZERO,
                paste_delay: Duration::ZERO,
            },
        );
        Self {
            store,
            clipboard,
            focus,
            presenter,
            controller,
        }
    }

    /// The in-memory clipboard as a trait object.
    pub fn system_clipboard(&self) -> Arc<dyn SystemClipboard> {
        Arc::clone(&self.clipboard) as Arc<dyn SystemClipboard>
    }
}
