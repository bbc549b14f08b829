//! History entry types.

use std::fmt;
use std::sync::Arc;

use crate::fingerprint::Fingerprint;
use crate::normalize::image_dimensions;

/// Kind of content held by a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Plain UTF-8 text
    Text,
    /// Encoded raster image
    Image,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Encoded image bytes together with their fingerprint.
///
/// The bytes are shared, so cloning an entry (for example when handing out a
/// history snapshot) never copies the image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    fingerprint: Fingerprint,
}

impl ImageData {
    /// Wrap encoded image bytes, computing their fingerprint.
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let fingerprint = Fingerprint::of(&bytes);
        Self { bytes, fingerprint }
    }

    /// Encoded image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fingerprint of the encoded bytes.
    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Size of the encoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Pixel dimensions, if the payload is a decodable image.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image_dimensions(&self.bytes)
    }
}

/// Content of a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipContent {
    /// Trimmed, non-empty text
    Text(String),
    /// Normalized image
    Image(ImageData),
}

impl ClipContent {
    /// Kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Text(_) => EntryKind::Text,
            Self::Image(_) => EntryKind::Image,
        }
    }

    /// Whether two contents are duplicates of each other.
    ///
    /// Text compares verbatim, images compare by fingerprint.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Image(a), Self::Image(b)) => a.fingerprint == b.fingerprint,
            _ => false,
        }
    }

    /// One-line preview (escaped newlines, truncated text, or image summary).
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            Self::Text(text) => {
                let escaped = text.replace('\n', "\\n");
                if escaped.chars().count() <= max_chars {
                    format!("\"{escaped}\"")
                } else {
                    let head: String = escaped.chars().take(max_chars).collect();
                    format!("\"{head}...\"")
                }
            }
            Self::Image(image) => image.dimensions().map_or_else(
                || format!("Image ({} KB)", image.len() / 1024),
                |(w, h)| format!("Image ({w}x{h})"),
            ),
        }
    }
}

/// A single clipboard history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// What was copied
    pub content: ClipContent,
    /// Exempt from eviction and dedup replacement, persisted across restarts
    pub pinned: bool,
}

impl HistoryEntry {
    /// Fresh, unpinned entry.
    #[must_use]
    pub const fn new(content: ClipContent) -> Self {
        Self {
            content,
            pinned: false,
        }
    }

    /// Pinned entry (as restored from disk).
    #[must_use]
    pub const fn pinned(content: ClipContent) -> Self {
        Self {
            content,
            pinned: true,
        }
    }

    /// Kind of the entry's content.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.content.kind()
    }

    /// Text content, if this is a text entry.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ClipContent::Text(text) => Some(text),
            ClipContent::Image(_) => None,
        }
    }

    /// Image content, if this is an image entry.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageData> {
        match &self.content {
            ClipContent::Image(image) => Some(image),
            ClipContent::Text(_) => None,
        }
    }

    /// One-line preview of the content.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.preview(max_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_preview() {
        let content = ClipContent::Text("line one\nline two".to_string());
        assert_eq!(content.preview(100), "\"line one\\nline two\"");
        assert_eq!(content.preview(4), "\"line...\"");
    }

    #[test]
    fn test_undecodable_image_preview() {
        let content = ClipContent::Image(ImageData::new(vec![0u8; 4096]));
        assert_eq!(content.preview(10), "Image (4 KB)");
    }

    #[test]
    fn test_same_as_distinguishes_kinds() {
        let text = ClipContent::Text("abc".to_string());
        let image = ClipContent::Image(ImageData::new(b"abc".to_vec()));
        assert!(!text.same_as(&image));
        assert!(image.same_as(&ClipContent::Image(ImageData::new(b"abc".to_vec()))));
    }

    #[test]
    fn test_entry_accessors() {
        let entry = HistoryEntry::new(ClipContent::Text("hello".to_string()));
        assert_eq!(entry.kind(), EntryKind::Text);
        assert_eq!(entry.text(), Some("hello"));
        assert!(entry.image().is_none());
        assert!(!entry.pinned);
        assert!(HistoryEntry::pinned(entry.content).pinned);
    }
}
