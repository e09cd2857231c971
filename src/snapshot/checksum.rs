//! CRC32 (IEEE) checksums for snapshot files
//!
//! Rendered as `crc32:xxxxxxxx` (lowercase hex, zero-padded).

use crc32fast::Hasher;

const PREFIX: &str = "crc32:";

/// Computes the raw CRC32 of `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn format_checksum(checksum: u32) -> String {
    format!("{}{:08x}", PREFIX, checksum)
}

/// Parses `crc32:xxxxxxxx`. Returns `None` for any other shape.
pub fn parse_checksum(formatted: &str) -> Option<u32> {
    let hex = formatted.strip_prefix(PREFIX)?;
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Formatted checksum of `data`
pub fn checksum_of(data: &[u8]) -> String {
    format_checksum(compute_checksum(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_detects_changes() {
        assert_eq!(checksum_of(b"documents"), checksum_of(b"documents"));
        assert_ne!(checksum_of(b"documents"), checksum_of(b"Documents"));
    }

    #[test]
    fn test_known_value() {
        // CRC32/IEEE check value
        assert_eq!(checksum_of(b"123456789"), "crc32:cbf43926");
    }

    #[test]
    fn test_format_zero_padded() {
        assert_eq!(format_checksum(1), "crc32:00000001");
    }

    #[test]
    fn test_parse_checksum() {
        assert_eq!(parse_checksum("crc32:cbf43926"), Some(0xCBF4_3926));
        assert_eq!(parse_checksum("crc32:CBF43926"), Some(0xCBF4_3926));
        assert_eq!(parse_checksum("crc32:"), None);
        assert_eq!(parse_checksum("crc32:123456789"), None);
        assert_eq!(parse_checksum("md5:cbf43926"), None);
    }
}
