//! # s7sim Codec
//!
//! S7 data type codec for the s7sim PLC simulator.
//!
//! This crate packs and unpacks the elementary S7 data types used in
//! simulated data blocks:
//!
//! - BOOL, BYTE, WORD, INT, DWORD, DINT, REAL (big-endian)
//! - STRING[n] (1-byte max/actual length headers, ASCII)
//! - WSTRING[n] (2-byte big-endian headers, UTF-16BE)
//! - DT (8 bytes, BCD) and DTL (12 bytes)
//!
//! ## Usage
//!
//! ```
//! use s7sim_codec::{pack_value, unpack_value, PlcType, PlcValue};
//!
//! let bytes = pack_value(&PlcValue::Int(-5), &PlcType::Int).unwrap();
//! assert_eq!(bytes, vec![0xFF, 0xFB]);
//! assert_eq!(unpack_value(&bytes, &PlcType::Int).unwrap(), PlcValue::Int(-5));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::unpack_value;
pub use encoder::pack_value;
pub use error::{CodecError, CodecResult};
pub use value::{PlcType, PlcValue};
