//! Content fingerprints for duplicate detection.
//!
//! Fingerprints are xxHash64 digests: cheap to compute on multi-megabyte
//! screenshots and good enough to tell two clipboard payloads apart. They are
//! not cryptographic and must never be used for anything security related.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

/// Seed shared by every fingerprint so values are comparable across components.
const FINGERPRINT_SEED: u64 = 0;

/// Non-cryptographic identity of a binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint a byte slice.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(xxh64(data, FINGERPRINT_SEED))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
