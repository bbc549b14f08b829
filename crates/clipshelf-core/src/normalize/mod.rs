//! Downsampling of oversized clipboard images.
//!
//! Screenshots on high-density displays easily reach tens of megabytes once
//! decoded. Before an image enters the history it is scaled so that its larger
//! side is at most [`DEFAULT_MAX_DIMENSION`] pixels, which keeps text in
//! screenshots legible while bounding per-entry memory.
//!
//! Inputs that cannot be decoded are passed through untouched: an unknown
//! format is not an error, it is just stored as an opaque blob.

use std::borrow::Cow;
use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{Error, Result};

/// Default cap for the larger image dimension, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1200;

/// Scales oversized images down to a maximum dimension.
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    max_dimension: u32,
}

impl ImageNormalizer {
    /// Create a normalizer with the given maximum dimension.
    #[must_use]
    pub const fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Normalize encoded image bytes.
    ///
    /// Returns the input unchanged when it cannot be decoded or already fits.
    /// Otherwise the image is resampled with a Catmull-Rom filter so the larger
    /// side equals the maximum dimension and re-encoded as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error only if re-encoding the scaled image fails; callers
    /// are expected to fall back to the original bytes.
    pub fn normalize<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let Ok(img) = image::load_from_memory(data) else {
            tracing::debug!(bytes = data.len(), "Image not decodable, storing as-is");
            return Ok(Cow::Borrowed(data));
        };

        let (width, height) = img.dimensions();
        let Some((new_width, new_height)) = self.target_size(width, height) else {
            return Ok(Cow::Borrowed(data));
        };

        let scaled = img.resize_exact(new_width, new_height, FilterType::CatmullRom);
        let encoded = encode_png(&DynamicImage::ImageRgba8(scaled.to_rgba8()))?;

        tracing::debug!(
            "Image scaled {}x{} -> {}x{} ({} -> {} bytes)",
            width,
            height,
            new_width,
            new_height,
            data.len(),
            encoded.len()
        );

        Ok(Cow::Owned(encoded))
    }

    /// Compute the scaled size, or `None` if the image already fits.
    ///
    /// The larger side becomes exactly `max_dimension`; the other side is
    /// scaled proportionally and rounded down (never below one pixel).
    #[must_use]
    pub fn target_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let max = self.max_dimension;
        if width <= max && height <= max {
            return None;
        }

        let scale = |side: u32, longest: u32| -> u32 {
            let scaled = u64::from(side) * u64::from(max) / u64::from(longest);
            u32::try_from(scaled).unwrap_or(max).max(1)
        };

        if width > height {
            Some((max, scale(height, width)))
        } else {
            Some((scale(width, height), max))
        }
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

/// Read the pixel dimensions of encoded image bytes without a full decode.
#[must_use]
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| Error::ImageError(format!("failed to encode PNG: {e}")))?;
    Ok(buf)
}
