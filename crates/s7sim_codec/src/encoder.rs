//! Packing of S7 values into their DB byte layout.

use crate::error::{CodecError, CodecResult};
use crate::value::{PlcType, PlcValue};
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Packs a value into the big-endian S7 byte layout of the given type.
///
/// String values longer than the declared maximum are truncated, matching
/// PLC behavior; all other mismatches are errors.
///
/// # Errors
///
/// Returns [`CodecError::TypeMismatch`] when the value kind does not fit the
/// declared type, and string/date errors for malformed payloads.
pub fn pack_value(value: &PlcValue, ty: &PlcType) -> CodecResult<Vec<u8>> {
    match (ty, value) {
        (PlcType::Bool, PlcValue::Bool(b)) => Ok(vec![u8::from(*b)]),
        (PlcType::Byte, PlcValue::Byte(b)) => Ok(vec![*b]),
        (PlcType::Word, PlcValue::Word(v)) => Ok(v.to_be_bytes().to_vec()),
        (PlcType::Int, PlcValue::Int(v)) => Ok(v.to_be_bytes().to_vec()),
        (PlcType::DWord, PlcValue::DWord(v)) => Ok(v.to_be_bytes().to_vec()),
        (PlcType::DInt, PlcValue::DInt(v)) => Ok(v.to_be_bytes().to_vec()),
        (PlcType::Real, PlcValue::Real(v)) => Ok(v.to_be_bytes().to_vec()),
        (PlcType::String { max_len }, PlcValue::Text(s)) => pack_string(s, *max_len),
        (PlcType::WString { max_len }, PlcValue::Text(s)) => pack_wstring(s, *max_len),
        (PlcType::Dt, PlcValue::DateTime(dt)) => pack_dt(dt),
        (PlcType::Dtl, PlcValue::DateTime(dt)) => pack_dtl(dt),
        (ty, value) => Err(CodecError::type_mismatch(ty.to_string(), value.kind())),
    }
}

fn pack_string(s: &str, max_len: u8) -> CodecResult<Vec<u8>> {
    if !s.is_ascii() {
        return Err(CodecError::invalid_string("STRING payload must be ASCII"));
    }
    let truncated: &str = if s.len() > usize::from(max_len) {
        &s[..usize::from(max_len)]
    } else {
        s
    };
    let mut out = Vec::with_capacity(usize::from(max_len) + 2);
    out.push(max_len);
    out.push(truncated.len() as u8);
    out.extend_from_slice(truncated.as_bytes());
    // Pad to the full footprint so a field write overwrites stale tail bytes.
    out.resize(usize::from(max_len) + 2, 0);
    Ok(out)
}

fn pack_wstring(s: &str, max_len: u16) -> CodecResult<Vec<u8>> {
    let units: Vec<u16> = s.encode_utf16().take(usize::from(max_len)).collect();
    let mut out = Vec::with_capacity(4 + usize::from(max_len) * 2);
    out.extend_from_slice(&max_len.to_be_bytes());
    out.extend_from_slice(&(units.len() as u16).to_be_bytes());
    for unit in units {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out.resize(4 + usize::from(max_len) * 2, 0);
    Ok(out)
}

fn to_bcd(v: u32) -> u8 {
    (((v / 10) << 4) | (v % 10)) as u8
}

/// S7 weekday numbering: 1 = Sunday .. 7 = Saturday.
fn s7_weekday(dt: &NaiveDateTime) -> u32 {
    dt.weekday().num_days_from_sunday() + 1
}

/// DATE_AND_TIME: 8 bytes, BCD. Byte 6 holds the two most significant
/// millisecond digits, byte 7 the least significant digit and the weekday.
fn pack_dt(dt: &NaiveDateTime) -> CodecResult<Vec<u8>> {
    let year = dt.year();
    if !(1990..2090).contains(&year) {
        return Err(CodecError::value_out_of_range(format!(
            "DT year {year} outside 1990..2089"
        )));
    }
    let millis = (dt.nanosecond() / 1_000_000).min(999);
    Ok(vec![
        to_bcd(year as u32 % 100),
        to_bcd(dt.month()),
        to_bcd(dt.day()),
        to_bcd(dt.hour()),
        to_bcd(dt.minute()),
        to_bcd(dt.second()),
        to_bcd(millis / 10),
        (((millis % 10) as u8) << 4) | to_bcd(s7_weekday(dt)),
    ])
}

/// DATE_AND_TIME_LONG: year(2) month(1) day(1) weekday(1) hour(1) minute(1)
/// second(1) nanoseconds(4), all big-endian.
fn pack_dtl(dt: &NaiveDateTime) -> CodecResult<Vec<u8>> {
    let year = u16::try_from(dt.year())
        .map_err(|_| CodecError::value_out_of_range(format!("DTL year {}", dt.year())))?;
    let mut out = Vec::with_capacity(12);
    out.extend_from_slice(&year.to_be_bytes());
    out.push(dt.month() as u8);
    out.push(dt.day() as u8);
    out.push(s7_weekday(dt) as u8);
    out.push(dt.hour() as u8);
    out.push(dt.minute() as u8);
    out.push(dt.second() as u8);
    out.extend_from_slice(&dt.nanosecond().to_be_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn pack_numeric_layouts() {
        assert_eq!(
            pack_value(&PlcValue::Word(0x1234), &PlcType::Word).unwrap(),
            vec![0x12, 0x34]
        );
        assert_eq!(
            pack_value(&PlcValue::Int(-1), &PlcType::Int).unwrap(),
            vec![0xFF, 0xFF]
        );
        assert_eq!(
            pack_value(&PlcValue::DInt(-2), &PlcType::DInt).unwrap(),
            vec![0xFF, 0xFF, 0xFF, 0xFE]
        );
        assert_eq!(
            pack_value(&PlcValue::Real(1.5), &PlcType::Real).unwrap(),
            vec![0x3F, 0xC0, 0x00, 0x00]
        );
    }

    #[test]
    fn pack_bool_and_byte() {
        assert_eq!(
            pack_value(&PlcValue::Bool(true), &PlcType::Bool).unwrap(),
            vec![1]
        );
        assert_eq!(
            pack_value(&PlcValue::Byte(0xAB), &PlcType::Byte).unwrap(),
            vec![0xAB]
        );
    }

    #[test]
    fn pack_string_header_and_payload() {
        let bytes = pack_value(&PlcValue::Text("abc".into()), &PlcType::String { max_len: 5 })
            .unwrap();
        assert_eq!(bytes, vec![5, 3, b'a', b'b', b'c', 0, 0]);
    }

    #[test]
    fn pack_string_truncates_to_max() {
        let bytes = pack_value(
            &PlcValue::Text("hello world".into()),
            &PlcType::String { max_len: 5 },
        )
        .unwrap();
        assert_eq!(bytes, vec![5, 5, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn pack_string_rejects_non_ascii() {
        let err = pack_value(&PlcValue::Text("héllo".into()), &PlcType::String { max_len: 8 })
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidString { .. }));
    }

    #[test]
    fn pack_wstring_utf16be() {
        let bytes = pack_value(&PlcValue::Text("hi".into()), &PlcType::WString { max_len: 4 })
            .unwrap();
        assert_eq!(bytes, vec![0, 4, 0, 2, 0, b'h', 0, b'i', 0, 0, 0, 0]);
    }

    #[test]
    fn pack_dt_bcd_layout() {
        // 2023-06-15 12:34:56, a Thursday (S7 weekday 5)
        let bytes = pack_value(&PlcValue::DateTime(dt(2023, 6, 15, 12, 34, 56)), &PlcType::Dt)
            .unwrap();
        assert_eq!(bytes, vec![0x23, 0x06, 0x15, 0x12, 0x34, 0x56, 0x00, 0x05]);
    }

    #[test]
    fn pack_dt_rejects_out_of_range_year() {
        let err = pack_value(&PlcValue::DateTime(dt(1980, 1, 1, 0, 0, 0)), &PlcType::Dt)
            .unwrap_err();
        assert!(matches!(err, CodecError::ValueOutOfRange { .. }));
    }

    #[test]
    fn pack_dtl_layout() {
        let bytes = pack_value(&PlcValue::DateTime(dt(2023, 6, 15, 12, 34, 56)), &PlcType::Dtl)
            .unwrap();
        assert_eq!(
            bytes,
            vec![0x07, 0xE7, 6, 15, 5, 12, 34, 56, 0, 0, 0, 0]
        );
    }

    #[test]
    fn pack_type_mismatch_fails() {
        let err = pack_value(&PlcValue::Bool(true), &PlcType::Int).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }
}
