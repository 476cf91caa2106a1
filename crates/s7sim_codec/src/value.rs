//! S7 type and value model.

use crate::error::{CodecError, CodecResult};
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// An S7 elementary data type as it appears in a DB definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcType {
    /// Single bit, stored in one byte.
    Bool,
    /// Unsigned 8-bit.
    Byte,
    /// Unsigned 16-bit, big-endian.
    Word,
    /// Signed 16-bit, big-endian.
    Int,
    /// Unsigned 32-bit, big-endian.
    DWord,
    /// Signed 32-bit, big-endian.
    DInt,
    /// IEEE 754 single precision, big-endian.
    Real,
    /// DATE_AND_TIME, 8 bytes, BCD-coded.
    Dt,
    /// DATE_AND_TIME_LONG, 12 bytes.
    Dtl,
    /// STRING[n]: 1-byte max length, 1-byte actual length, ASCII payload.
    String {
        /// Maximum character count.
        max_len: u8,
    },
    /// WSTRING[n]: 2-byte max length, 2-byte actual length, UTF-16BE payload.
    WString {
        /// Maximum UTF-16 code unit count.
        max_len: u16,
    },
}

impl PlcType {
    /// Returns the number of bytes this type occupies in a DB.
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Bool | Self::Byte => 1,
            Self::Word | Self::Int => 2,
            Self::DWord | Self::DInt | Self::Real => 4,
            Self::Dt => 8,
            Self::Dtl => 12,
            Self::String { max_len } => usize::from(*max_len) + 2,
            Self::WString { max_len } => 4 + usize::from(*max_len) * 2,
        }
    }

    /// Returns true for the parameterized string types.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String { .. } | Self::WString { .. })
    }
}

impl fmt::Display for PlcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Byte => write!(f, "BYTE"),
            Self::Word => write!(f, "WORD"),
            Self::Int => write!(f, "INT"),
            Self::DWord => write!(f, "DWORD"),
            Self::DInt => write!(f, "DINT"),
            Self::Real => write!(f, "REAL"),
            Self::Dt => write!(f, "DT"),
            Self::Dtl => write!(f, "DTL"),
            Self::String { max_len } => write!(f, "STRING[{max_len}]"),
            Self::WString { max_len } => write!(f, "WSTRING[{max_len}]"),
        }
    }
}

impl FromStr for PlcType {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "BOOL" => return Ok(Self::Bool),
            "BYTE" => return Ok(Self::Byte),
            "WORD" => return Ok(Self::Word),
            "INT" => return Ok(Self::Int),
            "DWORD" => return Ok(Self::DWord),
            "DINT" => return Ok(Self::DInt),
            "REAL" => return Ok(Self::Real),
            "DT" => return Ok(Self::Dt),
            "DTL" => return Ok(Self::Dtl),
            _ => {}
        }

        if let Some(n) = parse_bracketed(&upper, "STRING[") {
            let max_len =
                u8::try_from(n).map_err(|_| CodecError::value_out_of_range("STRING length"))?;
            return Ok(Self::String { max_len });
        }
        if let Some(n) = parse_bracketed(&upper, "WSTRING[") {
            let max_len =
                u16::try_from(n).map_err(|_| CodecError::value_out_of_range("WSTRING length"))?;
            return Ok(Self::WString { max_len });
        }

        Err(CodecError::unknown_type(s))
    }
}

fn parse_bracketed(upper: &str, prefix: &str) -> Option<u64> {
    let rest = upper.strip_prefix(prefix)?;
    let inner = rest.strip_suffix(']')?;
    inner.parse().ok()
}

/// A decoded S7 value.
#[derive(Debug, Clone, PartialEq)]
pub enum PlcValue {
    /// A BOOL value.
    Bool(bool),
    /// A BYTE value.
    Byte(u8),
    /// A WORD value.
    Word(u16),
    /// An INT value.
    Int(i16),
    /// A DWORD value.
    DWord(u32),
    /// A DINT value.
    DInt(i32),
    /// A REAL value.
    Real(f32),
    /// A STRING or WSTRING value.
    Text(String),
    /// A DT or DTL value.
    DateTime(NaiveDateTime),
}

impl PlcValue {
    /// A short name for this value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "BOOL",
            Self::Byte(_) => "BYTE",
            Self::Word(_) => "WORD",
            Self::Int(_) => "INT",
            Self::DWord(_) => "DWORD",
            Self::DInt(_) => "DINT",
            Self::Real(_) => "REAL",
            Self::Text(_) => "STRING",
            Self::DateTime(_) => "DT",
        }
    }
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Word(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::DWord(v) => write!(f, "{v}"),
            Self::DInt(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}
