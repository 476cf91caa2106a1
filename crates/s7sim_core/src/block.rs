//! A single simulated data block.

use crate::checksum::block_checksum;
use crate::error::{CoreError, CoreResult};

/// One fixed-size data block with its sync bookkeeping.
///
/// The checksum is recomputed atomically with every byte mutation and the
/// version counter bumps on every accepted write, so snapshot consumers can
/// detect staleness from the version alone.
#[derive(Debug, Clone)]
pub struct Block {
    db_number: u16,
    data: Vec<u8>,
    checksum: u32,
    version: u64,
    /// Internal checksum as of the last successful reconciliation.
    pub(crate) last_synced_internal: u32,
    /// External-side checksum as of the last successful reconciliation.
    pub(crate) last_synced_external: u32,
}

impl Block {
    /// Creates a zero-filled block of the given size.
    ///
    /// Both sync baselines start at the zero-fill checksum, so a freshly
    /// registered block reads as unchanged on both sides.
    pub fn new(db_number: u16, size: usize) -> Self {
        let data = vec![0u8; size];
        let checksum = block_checksum(&data);
        Self {
            db_number,
            data,
            checksum,
            version: 0,
            last_synced_internal: checksum,
            last_synced_external: checksum,
        }
    }

    /// The DB number of this block.
    pub fn db_number(&self) -> u16 {
        self.db_number
    }

    /// The declared size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The current bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The checksum of the current bytes.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// The monotonic version counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replaces the whole buffer. Fails on size mismatch, leaving the block
    /// untouched.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> CoreResult<u64> {
        if bytes.len() != self.data.len() {
            return Err(CoreError::SizeMismatch {
                db_number: self.db_number,
                expected: self.data.len(),
                actual: bytes.len(),
            });
        }
        self.data.copy_from_slice(bytes);
        self.touch();
        Ok(self.version)
    }

    /// Writes a byte range at the given offset.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> CoreResult<u64> {
        let end = offset.saturating_add(bytes.len());
        if end > self.data.len() {
            return Err(CoreError::RangeOutOfBounds {
                db_number: self.db_number,
                offset,
                len: bytes.len(),
                size: self.data.len(),
            });
        }
        self.data[offset..end].copy_from_slice(bytes);
        self.touch();
        Ok(self.version)
    }

    /// Sets or clears one bit of the byte at `offset`.
    pub fn write_bit(&mut self, offset: usize, bit: u8, on: bool) -> CoreResult<u64> {
        if bit > 7 {
            return Err(CoreError::BitOutOfRange { bit });
        }
        if offset >= self.data.len() {
            return Err(CoreError::RangeOutOfBounds {
                db_number: self.db_number,
                offset,
                len: 1,
                size: self.data.len(),
            });
        }
        if on {
            self.data[offset] |= 1 << bit;
        } else {
            self.data[offset] &= !(1 << bit);
        }
        self.touch();
        Ok(self.version)
    }

    fn touch(&mut self) {
        self.checksum = block_checksum(&self.data);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_zeroed_and_in_sync() {
        let block = Block::new(1, 4);
        assert_eq!(block.bytes(), &[0, 0, 0, 0]);
        assert_eq!(block.version(), 0);
        assert_eq!(block.checksum(), block.last_synced_internal);
        assert_eq!(block.checksum(), block.last_synced_external);
    }

    #[test]
    fn set_bytes_bumps_version_and_checksum() {
        let mut block = Block::new(1, 4);
        let before = block.checksum();
        let version = block.set_bytes(&[1, 2, 3, 4]).unwrap();
        assert_eq!(version, 1);
        assert_eq!(block.bytes(), &[1, 2, 3, 4]);
        assert_ne!(block.checksum(), before);
        assert_eq!(block.checksum(), block_checksum(&[1, 2, 3, 4]));
    }

    #[test]
    fn set_bytes_size_mismatch_leaves_block_untouched() {
        let mut block = Block::new(1, 4);
        block.set_bytes(&[9, 9, 9, 9]).unwrap();
        let err = block.set_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SizeMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
        assert_eq!(block.bytes(), &[9, 9, 9, 9]);
        assert_eq!(block.version(), 1);
    }

    #[test]
    fn write_at_partial_range() {
        let mut block = Block::new(1, 6);
        block.write_at(2, &[0xAA, 0xBB]).unwrap();
        assert_eq!(block.bytes(), &[0, 0, 0xAA, 0xBB, 0, 0]);
        assert_eq!(block.version(), 1);
    }

    #[test]
    fn write_at_out_of_bounds_fails() {
        let mut block = Block::new(1, 4);
        let err = block.write_at(3, &[1, 2]).unwrap_err();
        assert!(matches!(err, CoreError::RangeOutOfBounds { .. }));
        assert_eq!(block.version(), 0);
    }

    #[test]
    fn write_bit_sets_and_clears() {
        let mut block = Block::new(1, 2);
        block.write_bit(1, 3, true).unwrap();
        assert_eq!(block.bytes(), &[0, 0b0000_1000]);
        block.write_bit(1, 3, false).unwrap();
        assert_eq!(block.bytes(), &[0, 0]);
        assert_eq!(block.version(), 2);
    }

    #[test]
    fn write_bit_rejects_bad_index() {
        let mut block = Block::new(1, 1);
        assert!(matches!(
            block.write_bit(0, 8, true).unwrap_err(),
            CoreError::BitOutOfRange { bit: 8 }
        ));
    }
}
