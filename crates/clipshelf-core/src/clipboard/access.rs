//! Cross-platform clipboard access.
//!
//! This module implements [`SystemClipboard`] on top of the `arboard` crate.
//! `arboard` exposes no change counter, so [`NativeClipboard`] derives one:
//! every call to [`change_count`](SystemClipboard::change_count) fingerprints
//! the current content and bumps an internal counter when it differs from the
//! last observation. Writes made through this type bump the counter too.
//!
//! Images are identified by their size and a bounded sample of their pixels,
//! so the per-tick cost of the counter does not grow with screenshot size.

use std::borrow::Cow;
use std::sync::{Mutex, MutexGuard, PoisonError};

use arboard::Clipboard;
use image::ImageEncoder;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

use super::SystemClipboard;

/// Upper bound on the pixel bytes hashed to identify a clipboard image.
const SIGNATURE_SAMPLE: usize = 64 * 1024;

/// Bytes taken from each sampled position.
const SIGNATURE_CHUNK: usize = 64;

/// Identity of raw image pixels for change detection.
///
/// Hashes the dimensions plus the whole buffer when it is small, otherwise
/// evenly spaced chunks covering the buffer from start to end.
fn image_signature(width: usize, height: usize, bytes: &[u8]) -> Fingerprint {
    let mut sample = Vec::with_capacity(SIGNATURE_SAMPLE + 16);
    sample.extend_from_slice(&u64::try_from(width).unwrap_or(u64::MAX).to_le_bytes());
    sample.extend_from_slice(&u64::try_from(height).unwrap_or(u64::MAX).to_le_bytes());

    if bytes.len() <= SIGNATURE_SAMPLE {
        sample.extend_from_slice(bytes);
    } else {
        let chunks = SIGNATURE_SAMPLE / SIGNATURE_CHUNK;
        let stride = bytes.len() / chunks;
        for i in 0..chunks {
            let start = i * stride;
            sample.extend_from_slice(&bytes[start..start + SIGNATURE_CHUNK]);
        }
        // The tail is where screenshots of the same window usually differ.
        sample.extend_from_slice(&bytes[bytes.len() - SIGNATURE_CHUNK..]);
    }

    Fingerprint::of(&sample)
}

struct NativeState {
    clipboard: Clipboard,
    counter: u64,
    last_seen: Option<Fingerprint>,
}

impl NativeState {
    /// Fingerprint of whatever the clipboard currently holds.
    fn observe(&mut self) -> Option<Fingerprint> {
        match self.clipboard.get_text() {
            Ok(text) if !text.is_empty() => return Some(Fingerprint::of(text.as_bytes())),
            Ok(_) | Err(_) => {}
        }
        self.clipboard
            .get_image()
            .ok()
            .map(|image| image_signature(image.width, image.height, &image.bytes))
    }

    fn record_write(&mut self, fingerprint: Fingerprint) {
        self.counter = self.counter.wrapping_add(1);
        self.last_seen = Some(fingerprint);
    }
}

/// Native clipboard implementation using arboard.
pub struct NativeClipboard {
    state: Mutex<NativeState>,
}

impl std::fmt::Debug for NativeClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeClipboard").finish_non_exhaustive()
    }
}

impl NativeClipboard {
    /// Create a new native clipboard accessor.
    ///
    /// # Errors
    ///
    /// Returns an error if clipboard cannot be accessed.
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new()
            .map_err(|e| Error::ClipboardError(format!("failed to access clipboard: {e}")))?;
        let mut state = NativeState {
            clipboard,
            counter: 0,
            last_seen: None,
        };
        state.last_seen = state.observe();
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Verify clipboard is accessible (for early failure detection).
    ///
    /// # Errors
    ///
    /// Returns an error if neither text nor image content can be queried.
    pub fn verify_access(&self) -> Result<()> {
        let mut state = self.lock();
        match state.clipboard.get_text() {
            Ok(_) | Err(arboard::Error::ContentNotAvailable) => Ok(()),
            Err(text_err) => match state.clipboard.get_image() {
                Ok(_) | Err(arboard::Error::ContentNotAvailable) => Ok(()),
                Err(image_err) => {
                    let msg = format!(
                        "Cannot access clipboard (text: {text_err}, image: {image_err}). \
                         Check display server connection."
                    );
                    tracing::warn!("Clipboard: {}", msg);
                    Err(Error::ClipboardError(msg))
                }
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, NativeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SystemClipboard for NativeClipboard {
    fn change_count(&self) -> Result<u64> {
        let mut state = self.lock();
        let current = state.observe();
        if current != state.last_seen {
            state.counter = state.counter.wrapping_add(1);
            state.last_seen = current;
        }
        Ok(state.counter)
    }

    fn read_image(&self) -> Result<Option<Vec<u8>>> {
        let image = match self.lock().clipboard.get_image() {
            Ok(image) => image,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(e) => return Err(Error::ClipboardError(format!("failed to read image: {e}"))),
        };

        let width = u32::try_from(image.width)
            .map_err(|_| Error::ClipboardError("image width too large".to_string()))?;
        let height = u32::try_from(image.height)
            .map_err(|_| Error::ClipboardError("image height too large".to_string()))?;

        let png = encode_png(&image.bytes, width, height)?;
        tracing::trace!("Clipboard: read image {}x{}", width, height);
        Ok(Some(png))
    }

    fn read_text(&self) -> Result<Option<String>> {
        match self.lock().clipboard.get_text() {
            Ok(text) if text.is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(Error::ClipboardError(format!("failed to read text: {e}"))),
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut state = self.lock();
        state
            .clipboard
            .set_text(text.to_string())
            .map_err(|e| Error::ClipboardError(format!("failed to set text: {e}")))?;
        state.record_write(Fingerprint::of(text.as_bytes()));
        Ok(())
    }

    fn write_image(&self, data: &[u8]) -> Result<()> {
        let rgba = image::load_from_memory(data)
            .map_err(|e| Error::ImageError(format!("failed to decode image: {e}")))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let (width, height) = (width as usize, height as usize);
        let bytes = rgba.into_raw();
        let signature = image_signature(width, height, &bytes);

        let image_data = arboard::ImageData {
            width,
            height,
            bytes: Cow::Owned(bytes),
        };

        let mut state = self.lock();
        state
            .clipboard
            .set_image(image_data)
            .map_err(|e| Error::ClipboardError(format!("failed to set image: {e}")))?;
        state.record_write(signature);
        Ok(())
    }
}

fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        &mut png_data,
        image::codecs::png::CompressionType::Fast,
        image::codecs::png::FilterType::Adaptive,
    );
    encoder
        .write_image(rgba, width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| Error::ImageError(format!("failed to encode PNG: {e}")))?;
    Ok(png_data)
}

/// Probe the clipboard the way the watcher uses it.
///
/// Returns one line per check: the display environment (Linux), access, the
/// derived change counter and what an image or text read returns right now.
#[must_use]
pub fn diagnose_clipboard() -> Vec<String> {
    let mut report = display_environment();

    let clipboard = match NativeClipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            report.push(format!("ERROR: {e}"));
            return report;
        }
    };

    match clipboard.verify_access() {
        Ok(()) => report.push("Access: ok".to_string()),
        Err(e) => report.push(format!("Access: {e}")),
    }

    match (clipboard.change_count(), clipboard.change_count()) {
        (Ok(first), Ok(second)) if first == second => {
            report.push(format!("Change counter: {first}, stable while idle"));
        }
        (Ok(first), Ok(second)) => report.push(format!(
            "Change counter: moved {first} -> {second} without a copy, captures may repeat"
        )),
        (Err(e), _) | (_, Err(e)) => report.push(format!("Change counter: {e}")),
    }

    report.push(describe_image_read(clipboard.read_image()));
    report.push(match clipboard.read_text() {
        Ok(Some(text)) => format!("Text read: {} chars", text.chars().count()),
        Ok(None) => "Text read: no text on the clipboard".to_string(),
        Err(e) => format!("Text read: {e}"),
    });

    report
}

fn describe_image_read(result: Result<Option<Vec<u8>>>) -> String {
    match result {
        Ok(Some(data)) => match crate::normalize::image_dimensions(&data) {
            Some((width, height)) => {
                format!("Image read: PNG {}x{} ({} KB)", width, height, data.len() / 1024)
            }
            None => format!("Image read: {} bytes that are not a readable PNG", data.len()),
        },
        Ok(None) => "Image read: no image on the clipboard".to_string(),
        Err(e) => format!("Image read: {e}"),
    }
}

#[cfg(target_os = "linux")]
fn display_environment() -> Vec<String> {
    let wayland = std::env::var("WAYLAND_DISPLAY").ok();
    let x11 = std::env::var("DISPLAY").ok();
    if wayland.is_none() && x11.is_none() {
        return vec!["WARNING: neither WAYLAND_DISPLAY nor DISPLAY is set".to_string()];
    }

    wayland
        .map(|display| format!("Wayland display: {display}"))
        .into_iter()
        .chain(x11.map(|display| format!("X11 display: {display}")))
        .collect()
}

#[cfg(not(target_os = "linux"))]
fn display_environment() -> Vec<String> {
    Vec::new()
}

/// Create the platform clipboard accessor.
///
/// # Errors
///
/// Returns an error if the clipboard cannot be opened or queried.
pub fn create_clipboard() -> Result<std::sync::Arc<dyn SystemClipboard>> {
    let clipboard = NativeClipboard::new()?;
    clipboard.verify_access()?;
    Ok(std::sync::Arc::new(clipboard))
}
