//! Short content digests for observability records.

use md5::{Digest, Md5};
use std::fmt::Write;

/// Returns a short hex digest (first 8 bytes of MD5) of the given bytes.
///
/// The digest identifies context states in transition records; it is not a
/// security primitive.
#[must_use]
pub fn short_digest(bytes: &[u8]) -> String {
    let hash = Md5::digest(bytes);
    let mut out = String::with_capacity(16);
    for byte in hash.iter().take(8) {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_digest_length_and_stability() {
        let digest = short_digest(b"hello");
        assert_eq!(digest.len(), 16);
        assert_eq!(digest, short_digest(b"hello"));
    }

    #[test]
    fn test_short_digest_differs_on_content() {
        assert_ne!(short_digest(b"hello"), short_digest(b"world"));
    }

    #[test]
    fn test_short_digest_is_hex() {
        assert!(short_digest(b"abc").chars().all(|c| c.is_ascii_hexdigit()));
    }
}
