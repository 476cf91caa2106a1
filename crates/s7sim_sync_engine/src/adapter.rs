//! External buffer abstraction.
//!
//! The transport collaborator owns the live block memory seen by remote S7
//! clients. This trait wraps only its store of bytes; connection handling
//! and the wire protocol stay on the transport's side of the line. Every
//! read reflects the transport's state at call time and is treated as a
//! snapshot-in-time, never as a locked resource.

use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// The transport-side block memory.
///
/// Calls are expected to be non-blocking or bounded-latency; a failure is
/// transient for the current tick only.
pub trait ExternalBuffer: Send + Sync {
    /// Registers a block of the given size with the transport.
    fn register_block(&self, db_number: u16, size: usize) -> SyncResult<()>;

    /// Reads the transport's current bytes for a block.
    fn read_block(&self, db_number: u16) -> SyncResult<Vec<u8>>;

    /// Overwrites the transport's bytes for a block.
    fn write_block(&self, db_number: u16, bytes: &[u8]) -> SyncResult<()>;
}

/// An in-process external buffer.
///
/// Used by tests and the CLI in place of a real transport. Supports fault
/// injection per block and counts engine-side writes, so tests can assert
/// that quiet ticks issue no writes.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    blocks: RwLock<HashMap<u16, Vec<u8>>>,
    failing_reads: RwLock<HashSet<u16>>,
    failing_writes: RwLock<HashSet<u16>>,
    write_counts: RwLock<HashMap<u16, u64>>,
}

impl MemoryBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a remote S7 client writing a block.
    ///
    /// Bypasses fault injection and write counting, which both model the
    /// engine's side of the adapter.
    pub fn client_write(&self, db_number: u16, bytes: &[u8]) -> SyncResult<()> {
        let mut blocks = self.blocks.write();
        let slot = blocks
            .get_mut(&db_number)
            .ok_or(SyncError::NotRegistered { db_number })?;
        if bytes.len() != slot.len() {
            return Err(SyncError::transport(format!(
                "client write size {} != block size {}",
                bytes.len(),
                slot.len()
            )));
        }
        slot.copy_from_slice(bytes);
        Ok(())
    }

    /// Returns a copy of a block's current bytes, bypassing fault injection.
    pub fn contents(&self, db_number: u16) -> Option<Vec<u8>> {
        self.blocks.read().get(&db_number).cloned()
    }

    /// Makes subsequent `read_block` calls fail for the block.
    pub fn set_read_failure(&self, db_number: u16, failing: bool) {
        let mut set = self.failing_reads.write();
        if failing {
            set.insert(db_number);
        } else {
            set.remove(&db_number);
        }
    }

    /// Makes subsequent `write_block` calls fail for the block.
    pub fn set_write_failure(&self, db_number: u16, failing: bool) {
        let mut set = self.failing_writes.write();
        if failing {
            set.insert(db_number);
        } else {
            set.remove(&db_number);
        }
    }

    /// Number of engine writes to the block since registration.
    pub fn write_count(&self, db_number: u16) -> u64 {
        self.write_counts
            .read()
            .get(&db_number)
            .copied()
            .unwrap_or(0)
    }
}

impl ExternalBuffer for MemoryBuffer {
    fn register_block(&self, db_number: u16, size: usize) -> SyncResult<()> {
        let mut blocks = self.blocks.write();
        if blocks.contains_key(&db_number) {
            return Err(SyncError::transport(format!(
                "DB{db_number} already registered"
            )));
        }
        blocks.insert(db_number, vec![0u8; size]);
        Ok(())
    }

    fn read_block(&self, db_number: u16) -> SyncResult<Vec<u8>> {
        if self.failing_reads.read().contains(&db_number) {
            return Err(SyncError::transport("injected read failure"));
        }
        self.blocks
            .read()
            .get(&db_number)
            .cloned()
            .ok_or(SyncError::NotRegistered { db_number })
    }

    fn write_block(&self, db_number: u16, bytes: &[u8]) -> SyncResult<()> {
        if self.failing_writes.read().contains(&db_number) {
            return Err(SyncError::transport("injected write failure"));
        }
        let mut blocks = self.blocks.write();
        let slot = blocks
            .get_mut(&db_number)
            .ok_or(SyncError::NotRegistered { db_number })?;
        if bytes.len() != slot.len() {
            return Err(SyncError::transport(format!(
                "write size {} != block size {}",
                bytes.len(),
                slot.len()
            )));
        }
        slot.copy_from_slice(bytes);
        *self.write_counts.write().entry(db_number).or_insert(0) += 1;
        Ok(())
    }
}
