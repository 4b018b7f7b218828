//! Content hashing utilities.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a content hash for arbitrary bytes
pub fn content_hash(data: &[u8]) -> u64 {
    xxh3_64(data)
}

/// Short hex form of a content hash for logs and reports.
pub fn short_hash(hash: u64) -> String {
    format!("{hash:016x}")[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let data = b"[Device]\nVendCode = 1;";
        let hash = content_hash(data);
        assert_ne!(hash, 0);

        // Same input should produce same hash
        assert_eq!(hash, content_hash(data));

        // Different input should produce different hash
        assert_ne!(hash, content_hash(b"[Device]\nVendCode = 2;"));
    }

    #[test]
    fn test_short_hash() {
        let short = short_hash(0xDEAD_BEEF_0000_1111);
        assert_eq!(short.len(), 12);
        assert_eq!(short, "deadbeef0000");
    }
}
