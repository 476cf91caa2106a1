//! Block definition files.
//!
//! A definition file lists every DB with its fields and optional initial
//! values. The set of blocks is fixed at startup; the simulator never
//! creates or destroys blocks at runtime.

use crate::error::{CoreError, CoreResult};
use crate::fields::{DbLayout, FieldSpec, LayoutRegistry};
use crate::gateway::WriteGateway;
use crate::store::BlockStore;
use chrono::NaiveDateTime;
use s7sim_codec::{PlcType, PlcValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Largest addressable DB, matching the 64 KiB limit of real S7 blocks.
const MAX_DB_SIZE: usize = 65536;

/// The root of a definition file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// The data blocks to simulate.
    pub dbs: Vec<DbDefinition>,
}

/// One DB definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbDefinition {
    /// The DB number exposed to S7 clients.
    pub db_number: u16,
    /// The fields of this block.
    pub fields: Vec<FieldDefinition>,
}

/// One field definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDefinition {
    /// Field name, unique within the DB.
    pub name: String,
    /// S7 type name, e.g. `INT`, `REAL`, `STRING[20]`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Byte offset inside the block.
    pub offset: usize,
    /// Bit index for BOOL fields sharing a byte.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit: Option<u8>,
    /// Optional initial value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl SimulatorConfig {
    /// Loads and validates a definition file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates a definition document.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks structure, types, offsets, and initial value compatibility.
    pub fn validate(&self) -> CoreResult<()> {
        let mut db_numbers = HashSet::new();
        for db in &self.dbs {
            if !db_numbers.insert(db.db_number) {
                return Err(CoreError::invalid_config(format!(
                    "duplicate db_number: {}",
                    db.db_number
                )));
            }
            let mut field_names = HashSet::new();
            for field in &db.fields {
                if !field_names.insert(field.name.as_str()) {
                    return Err(CoreError::invalid_config(format!(
                        "duplicate field name {} in DB{}",
                        field.name, db.db_number
                    )));
                }
                let ty: PlcType = field.type_name.parse()?;
                let end = field.offset.saturating_add(ty.byte_size());
                if end > MAX_DB_SIZE {
                    return Err(CoreError::invalid_config(format!(
                        "field {} in DB{}: offset {} + {} bytes exceeds the {MAX_DB_SIZE}-byte block limit",
                        field.name,
                        db.db_number,
                        field.offset,
                        ty.byte_size()
                    )));
                }
                if let Some(bit) = field.bit {
                    if ty != PlcType::Bool {
                        return Err(CoreError::invalid_config(format!(
                            "field {} in DB{}: bit index only valid for BOOL",
                            field.name, db.db_number
                        )));
                    }
                    if bit > 7 {
                        return Err(CoreError::BitOutOfRange { bit });
                    }
                }
                if let Some(value) = &field.value {
                    field_value_from_json(value, &ty).map_err(|e| {
                        CoreError::invalid_config(format!(
                            "field {} in DB{}: initial value incompatible with {}: {e}",
                            field.name, db.db_number, ty
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Builds the field layouts, one per DB.
    pub fn layouts(&self) -> CoreResult<LayoutRegistry> {
        let mut layouts = Vec::with_capacity(self.dbs.len());
        for db in &self.dbs {
            let mut fields = Vec::with_capacity(db.fields.len());
            for field in &db.fields {
                fields.push(FieldSpec {
                    name: field.name.clone(),
                    ty: field.type_name.parse()?,
                    offset: field.offset,
                    bit: field.bit,
                });
            }
            layouts.push(DbLayout::new(db.db_number, fields));
        }
        Ok(LayoutRegistry::new(layouts))
    }

    /// Builds the store with every block registered and initial values
    /// applied through the write gateway, so the startup writes use the
    /// same bookkeeping as any other local write.
    pub fn build_store(&self) -> CoreResult<(Arc<BlockStore>, Arc<LayoutRegistry>)> {
        self.validate()?;
        let layouts = Arc::new(self.layouts()?);
        let store = Arc::new(BlockStore::new());

        for layout in layouts.iter() {
            store.register(layout.db_number(), layout.size())?;
            info!(
                db_number = layout.db_number(),
                size = layout.size(),
                "created block"
            );
        }

        let gateway = WriteGateway::new(Arc::clone(&store), Arc::clone(&layouts));
        for db in &self.dbs {
            for field in &db.fields {
                if let Some(value) = &field.value {
                    let ty: PlcType = field.type_name.parse()?;
                    let value = field_value_from_json(value, &ty)?;
                    info!(
                        db_number = db.db_number,
                        field = %field.name,
                        %value,
                        "applying initial value"
                    );
                    gateway.write_field(db.db_number, &field.name, &value)?;
                }
            }
        }

        Ok((store, layouts))
    }
}

/// Converts a JSON definition value to a typed S7 value.
///
/// Numbers may also be given as strings, and BOOLs accept the usual
/// true/false/1/0/yes/no spellings.
pub fn field_value_from_json(value: &serde_json::Value, ty: &PlcType) -> CoreResult<PlcValue> {
    use serde_json::Value as Json;

    let mismatch = || {
        CoreError::Codec(s7sim_codec::CodecError::type_mismatch(
            ty.to_string(),
            json_kind(value),
        ))
    };

    match ty {
        PlcType::Bool => match value {
            Json::Bool(b) => Ok(PlcValue::Bool(*b)),
            Json::Number(n) => Ok(PlcValue::Bool(n.as_i64() == Some(1))),
            Json::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(PlcValue::Bool(true)),
                "false" | "0" | "no" => Ok(PlcValue::Bool(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        PlcType::Byte => Ok(PlcValue::Byte(parse_int(value, ty)?)),
        PlcType::Word => Ok(PlcValue::Word(parse_int(value, ty)?)),
        PlcType::Int => Ok(PlcValue::Int(parse_int(value, ty)?)),
        PlcType::DWord => Ok(PlcValue::DWord(parse_int(value, ty)?)),
        PlcType::DInt => Ok(PlcValue::DInt(parse_int(value, ty)?)),
        PlcType::Real => match value {
            Json::Number(n) => n
                .as_f64()
                .map(|f| PlcValue::Real(f as f32))
                .ok_or_else(mismatch),
            Json::String(s) => s
                .parse::<f32>()
                .map(PlcValue::Real)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        PlcType::String { max_len } => {
            let s = value.as_str().ok_or_else(mismatch)?;
            if s.len() > usize::from(*max_len) {
                return Err(CoreError::invalid_config(format!(
                    "value exceeds STRING[{max_len}] length"
                )));
            }
            Ok(PlcValue::Text(s.to_string()))
        }
        PlcType::WString { max_len } => {
            let s = value.as_str().ok_or_else(mismatch)?;
            if s.encode_utf16().count() > usize::from(*max_len) {
                return Err(CoreError::invalid_config(format!(
                    "value exceeds WSTRING[{max_len}] length"
                )));
            }
            Ok(PlcValue::Text(s.to_string()))
        }
        PlcType::Dt | PlcType::Dtl => {
            let s = value.as_str().ok_or_else(mismatch)?;
            Ok(PlcValue::DateTime(parse_datetime(s, ty)?))
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn parse_int<T>(value: &serde_json::Value, ty: &PlcType) -> CoreResult<T>
where
    T: TryFrom<i64> + std::str::FromStr,
{
    let out_of_range = || {
        CoreError::Codec(s7sim_codec::CodecError::value_out_of_range(format!(
            "{value} does not fit {ty}"
        )))
    };
    match value {
        serde_json::Value::Number(n) => {
            let raw = n.as_i64().ok_or_else(out_of_range)?;
            T::try_from(raw).map_err(|_| out_of_range())
        }
        serde_json::Value::String(s) => s.trim().parse().map_err(|_| out_of_range()),
        _ => Err(CoreError::Codec(s7sim_codec::CodecError::type_mismatch(
            ty.to_string(),
            json_kind(value),
        ))),
    }
}

/// Parses `YYYY-MM-DD HH:MM:SS` (a `T` separator is accepted). DTL values
/// may carry a fractional second and a trailing weekday number, which is
/// ignored: the weekday is recomputed from the date when packing.
fn parse_datetime(s: &str, ty: &PlcType) -> CoreResult<NaiveDateTime> {
    let normalized = s.trim().replace('T', " ");
    let mut parts = normalized.split_whitespace();
    let (Some(date), Some(time)) = (parts.next(), parts.next()) else {
        return Err(CoreError::Codec(s7sim_codec::CodecError::invalid_datetime(
            format!("invalid {ty} string: {s}"),
        )));
    };
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S%.f").map_err(
        |_| {
            CoreError::Codec(s7sim_codec::CodecError::invalid_datetime(format!(
                "invalid {ty} string: {s}"
            )))
        },
    )
}
