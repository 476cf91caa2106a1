//! Copy-on-read snapshots.
//!
//! A snapshot is a fully-owned copy with no back-reference to the store.
//! Once handed out it never changes; callers discard it and capture again
//! to observe newer state.

use crate::block::Block;
use crate::error::CoreResult;
use crate::fields::FieldSpec;
use bytes::Bytes;
use s7sim_codec::PlcValue;
use std::collections::BTreeMap;

/// An immutable point-in-time copy of one block.
#[derive(Debug, Clone)]
pub struct BlockSnapshot {
    db_number: u16,
    bytes: Bytes,
    version: u64,
    checksum: u32,
}

impl BlockSnapshot {
    pub(crate) fn from_block(block: &Block) -> Self {
        Self {
            db_number: block.db_number(),
            bytes: Bytes::copy_from_slice(block.bytes()),
            version: block.version(),
            checksum: block.checksum(),
        }
    }

    /// The DB number.
    pub fn db_number(&self) -> u16 {
        self.db_number
    }

    /// The captured bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The block version at capture time.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The checksum at capture time.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Decodes one field out of the captured bytes.
    pub fn read_field(&self, field: &FieldSpec) -> CoreResult<PlcValue> {
        crate::fields::read_field(self.db_number, &self.bytes, field)
    }
}

/// An immutable point-in-time copy of all registered blocks.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    blocks: BTreeMap<u16, BlockSnapshot>,
}

impl Snapshot {
    pub(crate) fn new(blocks: BTreeMap<u16, BlockSnapshot>) -> Self {
        Self { blocks }
    }

    /// Looks up one block by DB number.
    pub fn block(&self, db_number: u16) -> Option<&BlockSnapshot> {
        self.blocks.get(&db_number)
    }

    /// Number of captured blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if no blocks were captured.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates blocks in ascending DB number order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockSnapshot> {
        self.blocks.values()
    }
}
