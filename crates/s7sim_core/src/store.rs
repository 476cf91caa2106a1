//! The authoritative data-block store.
//!
//! A single lock guards every block's bytes, checksum, and version. All
//! mutation paths (local writes, pulls from the external buffer) and
//! snapshot capture go through it, and it is never held across external
//! I/O or a sleep.

use crate::block::Block;
use crate::checksum::block_checksum;
use crate::error::{CoreError, CoreResult};
use crate::snapshot::{BlockSnapshot, Snapshot};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// The per-block, per-tick outcome of change classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Neither side changed since the last reconciliation.
    NoChange,
    /// Only the external side changed; its bytes were copied in.
    PullFromExternal,
    /// Only the internal side changed; its bytes must be written out.
    PushToExternal,
    /// Both sides changed in the same tick window; internal wins.
    Conflict,
}

/// The result of [`BlockStore::reconcile`] for one block.
///
/// A push is reported but not committed: the caller performs the external
/// write outside the lock and then calls [`BlockStore::confirm_push`], so a
/// failed write leaves the baselines untouched and the next tick retries.
#[derive(Debug, Clone)]
pub enum Reconciliation {
    /// Nothing to do.
    NoChange,
    /// External bytes were copied into the store under the lock.
    Pulled {
        /// The block version after the pull.
        version: u64,
    },
    /// The internal bytes must be pushed to the external buffer.
    PushNeeded {
        /// Copy of the internal bytes to write externally.
        bytes: Bytes,
        /// Checksum of those bytes, passed back to `confirm_push`.
        checksum: u32,
        /// True when the external side also changed (internal wins).
        conflict: bool,
    },
}

impl Reconciliation {
    /// The decision this outcome corresponds to.
    pub fn decision(&self) -> SyncDecision {
        match self {
            Self::NoChange => SyncDecision::NoChange,
            Self::Pulled { .. } => SyncDecision::PullFromExternal,
            Self::PushNeeded { conflict: false, .. } => SyncDecision::PushToExternal,
            Self::PushNeeded { conflict: true, .. } => SyncDecision::Conflict,
        }
    }
}

/// In-memory table of registered blocks.
///
/// The set of blocks is fixed after startup; only their contents change.
#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: RwLock<HashMap<u16, Block>>,
}

impl BlockStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zero-filled block. Called once per block at startup.
    pub fn register(&self, db_number: u16, size: usize) -> CoreResult<()> {
        let mut blocks = self.blocks.write();
        if blocks.contains_key(&db_number) {
            return Err(CoreError::DuplicateBlock { db_number });
        }
        blocks.insert(db_number, Block::new(db_number, size));
        debug!(db_number, size, "registered block");
        Ok(())
    }

    /// Returns the registered DB numbers in ascending order.
    pub fn db_numbers(&self) -> Vec<u16> {
        let mut numbers: Vec<u16> = self.blocks.read().keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    /// Returns the declared size of a block.
    pub fn size_of(&self, db_number: u16) -> CoreResult<usize> {
        let blocks = self.blocks.read();
        let block = get(&blocks, db_number)?;
        Ok(block.size())
    }

    /// Returns the current checksum and version of a block.
    pub fn state(&self, db_number: u16) -> CoreResult<(u32, u64)> {
        let blocks = self.blocks.read();
        let block = get(&blocks, db_number)?;
        Ok((block.checksum(), block.version()))
    }

    /// Returns an owned copy of a block's bytes.
    pub fn read_bytes(&self, db_number: u16) -> CoreResult<Bytes> {
        let blocks = self.blocks.read();
        let block = get(&blocks, db_number)?;
        Ok(Bytes::copy_from_slice(block.bytes()))
    }

    /// Replaces a block's bytes. Fails with `SizeMismatch` if the payload
    /// disagrees with the declared size, leaving the block untouched.
    pub fn mutate(&self, db_number: u16, bytes: &[u8]) -> CoreResult<u64> {
        let mut blocks = self.blocks.write();
        let block = get_mut(&mut blocks, db_number)?;
        let version = block.set_bytes(bytes)?;
        debug!(db_number, version, "mutated block");
        Ok(version)
    }

    /// Writes a byte range inside a block.
    pub fn write_at(&self, db_number: u16, offset: usize, bytes: &[u8]) -> CoreResult<u64> {
        let mut blocks = self.blocks.write();
        let block = get_mut(&mut blocks, db_number)?;
        block.write_at(offset, bytes)
    }

    /// Sets or clears one bit of a byte inside a block. The read-modify-write
    /// happens under the store lock.
    pub fn write_bit(&self, db_number: u16, offset: usize, bit: u8, on: bool) -> CoreResult<u64> {
        let mut blocks = self.blocks.write();
        let block = get_mut(&mut blocks, db_number)?;
        block.write_bit(offset, bit, on)
    }

    /// Captures a copy-on-read snapshot of every block.
    ///
    /// The lock is held only for the copy; consumers never contend with
    /// writers while reading the returned value.
    pub fn capture(&self) -> Snapshot {
        let blocks = self.blocks.read();
        let mut out = BTreeMap::new();
        for (db_number, block) in blocks.iter() {
            out.insert(*db_number, BlockSnapshot::from_block(block));
        }
        Snapshot::new(out)
    }

    /// Captures a snapshot of a single block.
    pub fn capture_block(&self, db_number: u16) -> CoreResult<BlockSnapshot> {
        let blocks = self.blocks.read();
        let block = get(&blocks, db_number)?;
        Ok(BlockSnapshot::from_block(block))
    }

    /// Classifies one block against the external bytes and applies a pull if
    /// the external side alone changed. One lock acquisition covers the
    /// compare and the merge, so local writes cannot interleave.
    ///
    /// The external bytes must have been read before this call, outside the
    /// lock.
    pub fn reconcile(&self, db_number: u16, external: &[u8]) -> CoreResult<Reconciliation> {
        let mut blocks = self.blocks.write();
        let block = get_mut(&mut blocks, db_number)?;
        if external.len() != block.size() {
            return Err(CoreError::SizeMismatch {
                db_number,
                expected: block.size(),
                actual: external.len(),
            });
        }

        let external_checksum = block_checksum(external);
        let internal_changed = block.checksum() != block.last_synced_internal;
        let external_changed = external_checksum != block.last_synced_external;

        match (internal_changed, external_changed) {
            (false, false) => Ok(Reconciliation::NoChange),
            (false, true) => {
                let version = block.set_bytes(external)?;
                block.last_synced_external = external_checksum;
                block.last_synced_internal = block.checksum();
                debug!(db_number, version, "external write detected, pulled into store");
                Ok(Reconciliation::Pulled { version })
            }
            (true, _) => Ok(Reconciliation::PushNeeded {
                bytes: Bytes::copy_from_slice(block.bytes()),
                checksum: block.checksum(),
                conflict: external_changed,
            }),
        }
    }

    /// Commits the baselines after a successful external write of bytes with
    /// the given checksum. If the block mutated again in the meantime the
    /// next tick will classify it as changed and push again.
    pub fn confirm_push(&self, db_number: u16, pushed_checksum: u32) -> CoreResult<()> {
        let mut blocks = self.blocks.write();
        let block = get_mut(&mut blocks, db_number)?;
        block.last_synced_internal = pushed_checksum;
        block.last_synced_external = pushed_checksum;
        Ok(())
    }
}

fn get(blocks: &HashMap<u16, Block>, db_number: u16) -> CoreResult<&Block> {
    blocks
        .get(&db_number)
        .ok_or(CoreError::BlockNotFound { db_number })
}

fn get_mut(blocks: &mut HashMap<u16, Block>, db_number: u16) -> CoreResult<&mut Block> {
    blocks
        .get_mut(&db_number)
        .ok_or(CoreError::BlockNotFound { db_number })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_block(db: u16, size: usize) -> BlockStore {
        let store = BlockStore::new();
        store.register(db, size).unwrap();
        store
    }

    #[test]
    fn register_duplicate_fails() {
        let store = store_with_block(1, 4);
        assert!(matches!(
            store.register(1, 8).unwrap_err(),
            CoreError::DuplicateBlock { db_number: 1 }
        ));
    }

    #[test]
    fn unknown_block_fails_with_not_found() {
        let store = BlockStore::new();
        assert!(matches!(
            store.read_bytes(42).unwrap_err(),
            CoreError::BlockNotFound { db_number: 42 }
        ));
        assert!(matches!(
            store.mutate(42, &[0]).unwrap_err(),
            CoreError::BlockNotFound { db_number: 42 }
        ));
    }

    #[test]
    fn db_numbers_sorted() {
        let store = BlockStore::new();
        store.register(7, 1).unwrap();
        store.register(1, 1).unwrap();
        store.register(3, 1).unwrap();
        assert_eq!(store.db_numbers(), vec![1, 3, 7]);
    }

    #[test]
    fn mutate_updates_state() {
        let store = store_with_block(1, 4);
        let (checksum0, version0) = store.state(1).unwrap();
        store.mutate(1, &[1, 2, 3, 4]).unwrap();
        let (checksum1, version1) = store.state(1).unwrap();
        assert_ne!(checksum0, checksum1);
        assert_eq!(version1, version0 + 1);
        assert_eq!(&store.read_bytes(1).unwrap()[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn reconcile_no_change() {
        let store = store_with_block(1, 4);
        let outcome = store.reconcile(1, &[0, 0, 0, 0]).unwrap();
        assert_eq!(outcome.decision(), SyncDecision::NoChange);
    }

    #[test]
    fn reconcile_pulls_external_change() {
        let store = store_with_block(1, 4);
        let outcome = store.reconcile(1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(outcome.decision(), SyncDecision::PullFromExternal);
        assert_eq!(&store.read_bytes(1).unwrap()[..], &[1, 2, 3, 4]);
        let (_, version) = store.state(1).unwrap();
        assert_eq!(version, 1);

        // Same external bytes again: baselines advanced, nothing to do.
        let outcome = store.reconcile(1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(outcome.decision(), SyncDecision::NoChange);
    }

    #[test]
    fn reconcile_reports_push_for_internal_change() {
        let store = store_with_block(1, 4);
        store.mutate(1, &[9, 9, 9, 9]).unwrap();
        let outcome = store.reconcile(1, &[0, 0, 0, 0]).unwrap();
        let Reconciliation::PushNeeded {
            bytes,
            checksum,
            conflict,
        } = outcome
        else {
            panic!("expected PushNeeded");
        };
        assert!(!conflict);
        assert_eq!(&bytes[..], &[9, 9, 9, 9]);

        // Without confirm_push the baselines stay put and the block still
        // classifies as changed.
        let outcome = store.reconcile(1, &[0, 0, 0, 0]).unwrap();
        assert_eq!(outcome.decision(), SyncDecision::PushToExternal);

        store.confirm_push(1, checksum).unwrap();
        let outcome = store.reconcile(1, &[9, 9, 9, 9]).unwrap();
        assert_eq!(outcome.decision(), SyncDecision::NoChange);
    }

    #[test]
    fn reconcile_conflict_internal_wins() {
        let store = store_with_block(1, 4);
        store.mutate(1, &[5, 5, 5, 5]).unwrap();
        let outcome = store.reconcile(1, &[7, 7, 7, 7]).unwrap();
        assert_eq!(outcome.decision(), SyncDecision::Conflict);
        // Internal bytes survive untouched.
        assert_eq!(&store.read_bytes(1).unwrap()[..], &[5, 5, 5, 5]);
    }

    #[test]
    fn reconcile_rejects_wrong_external_size() {
        let store = store_with_block(1, 4);
        assert!(matches!(
            store.reconcile(1, &[0, 0]).unwrap_err(),
            CoreError::SizeMismatch { .. }
        ));
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let store = store_with_block(1, 4);
        store.mutate(1, &[1, 1, 1, 1]).unwrap();
        let snapshot = store.capture();
        store.mutate(1, &[2, 2, 2, 2]).unwrap();

        let block = snapshot.block(1).unwrap();
        assert_eq!(&block.bytes()[..], &[1, 1, 1, 1]);
        assert_eq!(block.version(), 1);

        let fresh = store.capture();
        assert_eq!(&fresh.block(1).unwrap().bytes()[..], &[2, 2, 2, 2]);
        assert_eq!(fresh.block(1).unwrap().version(), 2);
    }
}
