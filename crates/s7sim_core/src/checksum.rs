//! Content checksums for change detection.
//!
//! The sync engine compares checksums, never raw bytes, to decide whether a
//! side changed since the last reconciliation. CRC32 is a consistency
//! optimization here, not a security boundary.

/// Computes the CRC32 (IEEE polynomial) of a block's bytes.
pub fn block_checksum(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_known_value() {
        // Standard CRC32 check value
        assert_eq!(block_checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn crc32_empty() {
        assert_eq!(block_checksum(b""), 0);
    }

    #[test]
    fn crc32_is_stable() {
        let data = vec![7u8; 64];
        assert_eq!(block_checksum(&data), block_checksum(&data));
    }

    #[test]
    fn crc32_detects_single_byte_change() {
        let a = vec![0u8; 32];
        let mut b = a.clone();
        b[17] = 1;
        assert_ne!(block_checksum(&a), block_checksum(&b));
    }
}
