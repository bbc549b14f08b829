//! Persistence of pinned history entries.
//!
//! Only pinned entries survive a restart. They are written as a pretty-printed
//! JSON array, replacing the whole file on every save:
//!
//! ```json
//! [
//!   { "type": "text", "text": "ssh deploy@10.0.0.4", "pinned": true },
//!   { "type": "image", "imageData": "data:image/png;base64,iVBORw0...", "pinned": true }
//! ]
//! ```
//!
//! ## File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.local/share/clipshelf/pinned.json` |
//! | macOS | `~/Library/Application Support/com.clipshelf.Clipshelf/pinned.json` |
//! | Windows | `%APPDATA%\clipshelf\Clipshelf\data\pinned.json` |

use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::history::{ClipContent, HistoryEntry, ImageData};

/// Prefix written in front of persisted image payloads.
const IMAGE_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// On-disk payload, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordContent {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "imageData")]
        image_data: String,
    },
}

/// One persisted entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PinnedRecord {
    #[serde(flatten)]
    content: RecordContent,
    #[serde(default = "default_pinned")]
    pinned: bool,
}

const fn default_pinned() -> bool {
    true
}

impl PinnedRecord {
    fn from_entry(entry: &HistoryEntry) -> Self {
        let content = match &entry.content {
            ClipContent::Text(text) => RecordContent::Text { text: text.clone() },
            ClipContent::Image(image) => RecordContent::Image {
                image_data: format!("{IMAGE_DATA_URI_PREFIX}{}", STANDARD.encode(image.bytes())),
            },
        };
        Self {
            content,
            pinned: true,
        }
    }

    /// Convert to a pinned entry; `None` for empty or undecodable payloads.
    fn into_entry(self) -> Option<HistoryEntry> {
        let content = match self.content {
            RecordContent::Text { text } => {
                if text.trim().is_empty() {
                    return None;
                }
                ClipContent::Text(text)
            }
            RecordContent::Image { image_data } => match decode_image_data(&image_data) {
                Ok(bytes) if !bytes.is_empty() => ClipContent::Image(ImageData::new(bytes)),
                Ok(_) => return None,
                Err(e) => {
                    tracing::warn!("Skipping pinned image: {}", e);
                    return None;
                }
            },
        };
        Some(HistoryEntry::pinned(content))
    }
}

/// Decode a base64 image payload, with or without a data URI prefix.
///
/// # Errors
///
/// Returns an error if the payload is not valid base64.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>> {
    let encoded = data.split_once(',').map_or(data, |(_, rest)| rest);
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Serialization(format!("invalid image data: {e}")))
}

/// JSON file holding pinned entries.
#[derive(Debug, Clone)]
pub struct PinnedStorage {
    path: PathBuf,
}

impl PinnedStorage {
    /// Storage at a specific path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the default per-user location.
    #[must_use]
    pub fn at_default_path() -> Self {
        Self::new(Self::default_path().unwrap_or_else(|| PathBuf::from("pinned.json")))
    }

    /// Default per-user path of the pinned entries file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "clipshelf", "Clipshelf")
            .map(|dirs| dirs.data_dir().join("pinned.json"))
    }

    /// Path of the pinned entries file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load pinned entries, logging failures.
    ///
    /// A missing file yields an empty list; an unreadable or malformed file is
    /// logged and treated as empty.
    #[must_use]
    pub fn load(&self) -> Vec<HistoryEntry> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to load pinned entries: {}", e);
                Vec::new()
            }
        }
    }

    /// Load pinned entries.
    ///
    /// Records with empty text or undecodable image data are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn try_load(&self) -> Result<Vec<HistoryEntry>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::StorageError(format!(
                    "failed to open {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let records: Vec<PinnedRecord> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                Error::StorageError(format!("failed to parse {}: {}", self.path.display(), e))
            })?;

        let total = records.len();
        let entries: Vec<_> = records
            .into_iter()
            .filter_map(PinnedRecord::into_entry)
            .collect();

        if entries.len() < total {
            tracing::debug!(skipped = total - entries.len(), "Skipped empty pinned records");
        }

        Ok(entries)
    }

    /// Save the pinned subset of `entries`, logging failures.
    pub fn save(&self, entries: &[HistoryEntry]) {
        if let Err(e) = self.try_save(entries) {
            tracing::warn!("Failed to save pinned entries: {}", e);
        }
    }

    /// Save the pinned subset of `entries`, replacing the file.
    ///
    /// Creates the containing directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn try_save(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::StorageError(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records: Vec<_> = entries
            .iter()
            .filter(|e| e.pinned)
            .map(PinnedRecord::from_entry)
            .collect();

        let file = fs::File::create(&self.path).map_err(|e| {
            Error::StorageError(format!("failed to create {}: {}", self.path.display(), e))
        })?;

        serde_json::to_writer_pretty(BufWriter::new(file), &records).map_err(|e| {
            Error::StorageError(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(count = records.len(), path = %self.path.display(), "Saved pinned entries");
        Ok(())
    }
}
