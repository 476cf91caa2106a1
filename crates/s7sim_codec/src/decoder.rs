//! Unpacking of S7 values from their DB byte layout.

use crate::error::{CodecError, CodecResult};
use crate::value::{PlcType, PlcValue};
use chrono::{NaiveDate, NaiveDateTime};

/// Unpacks a value of the given type from the start of `data`.
///
/// `data` may be longer than the type's footprint; trailing bytes are
/// ignored.
///
/// # Errors
///
/// Returns [`CodecError::NotEnoughBytes`] when the buffer is shorter than
/// the type requires, and string/date errors for malformed payloads.
pub fn unpack_value(data: &[u8], ty: &PlcType) -> CodecResult<PlcValue> {
    let needed = ty.byte_size();
    if data.len() < needed {
        return Err(CodecError::NotEnoughBytes {
            expected: needed,
            actual: data.len(),
        });
    }

    match ty {
        PlcType::Bool => Ok(PlcValue::Bool(data[0] != 0)),
        PlcType::Byte => Ok(PlcValue::Byte(data[0])),
        PlcType::Word => Ok(PlcValue::Word(u16::from_be_bytes([data[0], data[1]]))),
        PlcType::Int => Ok(PlcValue::Int(i16::from_be_bytes([data[0], data[1]]))),
        PlcType::DWord => Ok(PlcValue::DWord(u32::from_be_bytes([
            data[0], data[1], data[2], data[3],
        ]))),
        PlcType::DInt => Ok(PlcValue::DInt(i32::from_be_bytes([
            data[0], data[1], data[2], data[3],
        ]))),
        PlcType::Real => Ok(PlcValue::Real(f32::from_be_bytes([
            data[0], data[1], data[2], data[3],
        ]))),
        PlcType::String { max_len } => unpack_string(data, *max_len),
        PlcType::WString { max_len } => unpack_wstring(data, *max_len),
        PlcType::Dt => unpack_dt(data),
        PlcType::Dtl => unpack_dtl(data),
    }
}

fn unpack_string(data: &[u8], max_len: u8) -> CodecResult<PlcValue> {
    let actual = usize::from(data[1]);
    if actual > usize::from(max_len) {
        return Err(CodecError::invalid_string(format!(
            "actual length {actual} exceeds maximum {max_len}"
        )));
    }
    let payload = &data[2..2 + actual];
    if !payload.is_ascii() {
        return Err(CodecError::invalid_string("STRING payload must be ASCII"));
    }
    let text = std::str::from_utf8(payload)
        .map_err(|e| CodecError::invalid_string(e.to_string()))?;
    Ok(PlcValue::Text(text.to_string()))
}

fn unpack_wstring(data: &[u8], max_len: u16) -> CodecResult<PlcValue> {
    let actual = usize::from(u16::from_be_bytes([data[2], data[3]]));
    if actual > usize::from(max_len) {
        return Err(CodecError::invalid_string(format!(
            "actual length {actual} exceeds maximum {max_len}"
        )));
    }
    let units: Vec<u16> = data[4..4 + actual * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units)
        .map_err(|e| CodecError::invalid_string(e.to_string()))?;
    Ok(PlcValue::Text(text))
}

fn from_bcd(b: u8) -> u32 {
    u32::from(b >> 4) * 10 + u32::from(b & 0x0F)
}

fn unpack_dt(data: &[u8]) -> CodecResult<PlcValue> {
    let yy = from_bcd(data[0]);
    // Two-digit year: 90..99 map to the 1990s, everything else to 2000+.
    let year = if yy >= 90 { 1900 + yy } else { 2000 + yy } as i32;
    let millis = from_bcd(data[6]) * 10 + u32::from(data[7] >> 4);
    let date = NaiveDate::from_ymd_opt(year, from_bcd(data[1]), from_bcd(data[2]))
        .ok_or_else(|| CodecError::invalid_datetime("DT date fields"))?;
    let dt = date
        .and_hms_milli_opt(
            from_bcd(data[3]),
            from_bcd(data[4]),
            from_bcd(data[5]),
            millis,
        )
        .ok_or_else(|| CodecError::invalid_datetime("DT time fields"))?;
    Ok(PlcValue::DateTime(dt))
}

fn unpack_dtl(data: &[u8]) -> CodecResult<PlcValue> {
    let year = i32::from(u16::from_be_bytes([data[0], data[1]]));
    let nanos = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    let date = NaiveDate::from_ymd_opt(year, u32::from(data[2]), u32::from(data[3]))
        .ok_or_else(|| CodecError::invalid_datetime("DTL date fields"))?;
    let dt = date
        .and_hms_nano_opt(
            u32::from(data[5]),
            u32::from(data[6]),
            u32::from(data[7]),
            nanos,
        )
        .ok_or_else(|| CodecError::invalid_datetime("DTL time fields"))?;
    Ok(PlcValue::DateTime(dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_numeric_layouts() {
        assert_eq!(
            unpack_value(&[0x12, 0x34], &PlcType::Word).unwrap(),
            PlcValue::Word(0x1234)
        );
        assert_eq!(
            unpack_value(&[0xFF, 0xFF], &PlcType::Int).unwrap(),
            PlcValue::Int(-1)
        );
        assert_eq!(
            unpack_value(&[0x3F, 0xC0, 0x00, 0x00], &PlcType::Real).unwrap(),
            PlcValue::Real(1.5)
        );
    }

    #[test]
    fn unpack_ignores_trailing_bytes() {
        assert_eq!(
            unpack_value(&[0x00, 0x2A, 0xDE, 0xAD], &PlcType::Word).unwrap(),
            PlcValue::Word(42)
        );
    }

    #[test]
    fn unpack_short_buffer_fails() {
        let err = unpack_value(&[0x12], &PlcType::Word).unwrap_err();
        assert!(matches!(
            err,
            CodecError::NotEnoughBytes {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn unpack_string() {
        let data = [5, 3, b'a', b'b', b'c', 0, 0];
        assert_eq!(
            unpack_value(&data, &PlcType::String { max_len: 5 }).unwrap(),
            PlcValue::Text("abc".into())
        );
    }

    #[test]
    fn unpack_string_with_bad_actual_length_fails() {
        let data = [5, 9, 0, 0, 0, 0, 0];
        let err = unpack_value(&data, &PlcType::String { max_len: 5 }).unwrap_err();
        assert!(matches!(err, CodecError::InvalidString { .. }));
    }

    #[test]
    fn unpack_wstring() {
        let data = [0, 4, 0, 2, 0, b'h', 0, b'i', 0, 0, 0, 0];
        assert_eq!(
            unpack_value(&data, &PlcType::WString { max_len: 4 }).unwrap(),
            PlcValue::Text("hi".into())
        );
    }

    #[test]
    fn unpack_dt_two_digit_year_windows() {
        // 1995 encodes as BCD 0x95
        let data = [0x95, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x01];
        let PlcValue::DateTime(dt) = unpack_value(&data, &PlcType::Dt).unwrap() else {
            panic!("expected DateTime");
        };
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "1995-01-02 03:04:05");
    }

    #[test]
    fn unpack_dt_invalid_date_fails() {
        let data = [0x23, 0x13, 0x40, 0x00, 0x00, 0x00, 0x00, 0x01];
        assert!(unpack_value(&data, &PlcType::Dt).is_err());
    }

    #[test]
    fn unpack_dtl() {
        let data = [0x07, 0xE7, 6, 15, 5, 12, 34, 56, 0, 0, 0, 0];
        let PlcValue::DateTime(dt) = unpack_value(&data, &PlcType::Dtl).unwrap() else {
            panic!("expected DateTime");
        };
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-06-15 12:34:56");
    }
}
