//! The single entry point for local writes.
//!
//! GUI and script mutations both funnel through here, so every local write
//! participates in the same version/checksum bookkeeping the sync engine
//! relies on. No mutation path bypasses checksum recomputation.

use crate::error::{CoreError, CoreResult};
use crate::fields::LayoutRegistry;
use crate::store::BlockStore;
use s7sim_codec::{pack_value, PlcType, PlcValue};
use std::sync::Arc;
use tracing::debug;

/// Applies local writes to the store under its lock discipline.
#[derive(Debug, Clone)]
pub struct WriteGateway {
    store: Arc<BlockStore>,
    layouts: Arc<LayoutRegistry>,
}

impl WriteGateway {
    /// Creates a gateway over the given store and field layouts.
    pub fn new(store: Arc<BlockStore>, layouts: Arc<LayoutRegistry>) -> Self {
        Self { store, layouts }
    }

    /// Replaces a whole block's bytes.
    ///
    /// Fails with `SizeMismatch` when the payload disagrees with the
    /// declared size; the block is left untouched.
    pub fn apply_write(&self, db_number: u16, bytes: &[u8]) -> CoreResult<u64> {
        self.store.mutate(db_number, bytes)
    }

    /// Writes one typed field.
    ///
    /// BOOL fields with a bit index update a single bit; everything else is
    /// packed through the codec and written at the field's offset.
    pub fn write_field(&self, db_number: u16, name: &str, value: &PlcValue) -> CoreResult<u64> {
        let field = self.layouts.field(db_number, name)?;

        let version = if let (PlcType::Bool, Some(bit)) = (field.ty, field.bit) {
            let PlcValue::Bool(on) = value else {
                return Err(CoreError::Codec(s7sim_codec::CodecError::type_mismatch(
                    "BOOL",
                    value.kind(),
                )));
            };
            self.store.write_bit(db_number, field.offset, bit, *on)?
        } else {
            let packed = pack_value(value, &field.ty)?;
            self.store.write_at(db_number, field.offset, &packed)?
        };

        debug!(db_number, field = name, %value, version, "field written");
        Ok(version)
    }
}
