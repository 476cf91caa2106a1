//! Field layout of a data block.
//!
//! Fields address typed values inside a block by byte offset (plus a bit
//! index for BOOLs). The layout is fixed at startup from the definition
//! file and shared read-only between the gateway and snapshot readers.

use crate::error::{CoreError, CoreResult};
use s7sim_codec::{unpack_value, PlcType, PlcValue};
use std::collections::BTreeMap;

/// One named, typed field inside a block.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name, unique within its DB.
    pub name: String,
    /// The S7 type.
    pub ty: PlcType,
    /// Byte offset inside the block.
    pub offset: usize,
    /// Bit index for BOOL fields sharing a byte.
    pub bit: Option<u8>,
}

/// The field layout of one DB, with its computed size.
#[derive(Debug, Clone)]
pub struct DbLayout {
    db_number: u16,
    size: usize,
    fields: Vec<FieldSpec>,
}

impl DbLayout {
    /// Builds a layout, computing the block size as the maximum field end
    /// offset.
    pub fn new(db_number: u16, fields: Vec<FieldSpec>) -> Self {
        let size = fields
            .iter()
            .map(|f| f.offset.saturating_add(f.ty.byte_size()))
            .max()
            .unwrap_or(0);
        Self {
            db_number,
            size,
            fields,
        }
    }

    /// The DB number.
    pub fn db_number(&self) -> u16 {
        self.db_number
    }

    /// The computed block size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fields in definition order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up one field by name.
    pub fn field(&self, name: &str) -> CoreResult<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CoreError::FieldNotFound {
                db_number: self.db_number,
                name: name.to_string(),
            })
    }
}

/// All DB layouts, keyed by DB number.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    dbs: BTreeMap<u16, DbLayout>,
}

impl LayoutRegistry {
    /// Creates a registry from layouts.
    pub fn new(layouts: Vec<DbLayout>) -> Self {
        let dbs = layouts.into_iter().map(|l| (l.db_number(), l)).collect();
        Self { dbs }
    }

    /// Looks up a DB layout.
    pub fn layout(&self, db_number: u16) -> CoreResult<&DbLayout> {
        self.dbs
            .get(&db_number)
            .ok_or(CoreError::BlockNotFound { db_number })
    }

    /// Looks up one field.
    pub fn field(&self, db_number: u16, name: &str) -> CoreResult<&FieldSpec> {
        self.layout(db_number)?.field(name)
    }

    /// Iterates layouts in ascending DB number order.
    pub fn iter(&self) -> impl Iterator<Item = &DbLayout> {
        self.dbs.values()
    }
}

/// Decodes one field out of a block's bytes.
///
/// BOOL fields with a bit index read a single bit of the addressed byte.
pub fn read_field(db_number: u16, bytes: &[u8], field: &FieldSpec) -> CoreResult<PlcValue> {
    let needed = field.ty.byte_size();
    if field.offset + needed > bytes.len() {
        return Err(CoreError::RangeOutOfBounds {
            db_number,
            offset: field.offset,
            len: needed,
            size: bytes.len(),
        });
    }

    if let (PlcType::Bool, Some(bit)) = (field.ty, field.bit) {
        if bit > 7 {
            return Err(CoreError::BitOutOfRange { bit });
        }
        let byte = bytes[field.offset];
        return Ok(PlcValue::Bool((byte >> bit) & 1 == 1));
    }

    Ok(unpack_value(&bytes[field.offset..], &field.ty)?)
}
