//! Deterministic content hashing
//!
//! Embedded media files are identified by the blake3 hash of their bytes,
//! so the same picture used twice is only embedded once.

// =============================================================================
// StableHasher - Builder Pattern
// =============================================================================

/// A deterministic hasher using blake3
///
/// Unlike `std::hash::Hasher`, this produces the same output across
/// process restarts for the same input.
pub struct StableHasher {
    inner: blake3::Hasher,
}

impl StableHasher {
    /// Create a new StableHasher
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Update with raw bytes
    #[inline]
    pub fn update(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    /// Finish and return the hash as u64
    ///
    /// Takes the first 8 bytes of blake3 output as little-endian u64.
    #[inline]
    pub fn finish(self) -> u64 {
        let hash = self.inner.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a byte slice in one call.
pub fn content_hash(data: &[u8]) -> u64 {
    StableHasher::new().update(data).finish()
}

/// Eight hex digits, used as a file name suffix.
pub fn short_hex(hash: u64) -> String {
    format!("{:08x}", hash >> 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = content_hash(b"\x89PNG fake image");
        let b = StableHasher::new().update(b"\x89PNG ").update(b"fake image").finish();
        assert_eq!(a, b);
        assert_ne!(a, content_hash(b"other"));
    }

    #[test]
    fn test_short_hex() {
        assert_eq!(short_hex(0x1234_5678_9abc_def0), "12345678");
        assert_eq!(short_hex(0xff), "00000000");
        assert_eq!(short_hex(content_hash(b"x")).len(), 8);
    }
}
