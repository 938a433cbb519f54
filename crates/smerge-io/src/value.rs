//! Text and JSON forms of scalar values.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use smerge_core::config::parse_flag;
use smerge_core::schema::DataType;
use smerge_core::types::Scalar;

/// Parse one text cell as `ty`. An empty cell is null, except in a
/// non-nullable string column where it is the empty string.
///
/// Returns `None` when the text is not a valid `ty`.
pub fn parse_value(text: &str, ty: DataType, nullable: bool) -> Option<Scalar> {
    if text.is_empty() {
        return match (ty, nullable) {
            (DataType::Utf8, false) => Some(Scalar::Str(String::new())),
            (_, true) => Some(Scalar::Null),
            (_, false) => None,
        };
    }
    let t = text.trim();
    Some(match ty {
        DataType::Boolean => Scalar::Bool(parse_flag(t)?),
        DataType::Int32 => Scalar::I32(t.parse().ok()?),
        DataType::Int64 => Scalar::I64(t.parse().ok()?),
        DataType::Float32 => Scalar::F32(t.parse().ok()?),
        DataType::Float64 => Scalar::F64(t.parse().ok()?),
        DataType::Decimal => Scalar::Decimal(BigDecimal::from_str(t).ok()?),
        DataType::Utf8 => Scalar::Str(text.to_string()),
        DataType::Binary => Scalar::Bin(decode_hex(t)?),
        DataType::Timestamp => Scalar::Timestamp(parse_timestamp(t)?),
    })
}

/// RFC 3339, or naive `YYYY-MM-DD[ HH:MM:SS[.f]]` read as UTC.
pub fn parse_timestamp(t: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(t) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn decode_hex(t: &str) -> Option<Vec<u8>> {
    let t = t.strip_prefix("0x").unwrap_or(t);
    if t.len() % 2 != 0 {
        return None;
    }
    (0..t.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(t.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Text cell for a value. Null is the empty cell; timestamps keep
/// nanoseconds so a re-read compares equal.
pub fn format_value(v: &Scalar) -> String {
    match v {
        Scalar::Null => String::new(),
        Scalar::Timestamp(ts) => ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
        other => other.to_string(),
    }
}

/// JSON form. Decimals are strings so no precision is lost.
pub fn to_json(v: &Scalar) -> serde_json::Value {
    use serde_json::Value;
    match v {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::I32(i) => Value::from(*i),
        Scalar::I64(i) => Value::from(*i),
        // Non-finite floats have no JSON number form and become null.
        Scalar::F32(f) => Value::from(*f as f64),
        Scalar::F64(f) => Value::from(*f),
        Scalar::Decimal(d) => Value::String(d.to_string()),
        Scalar::Str(s) => Value::String(s.clone()),
        Scalar::Bin(_) | Scalar::Timestamp(_) => Value::String(format_value(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn empty_cells() {
        assert_eq!(parse_value("", DataType::Int64, true), Some(Scalar::Null));
        assert_eq!(parse_value("", DataType::Int64, false), None);
        assert_eq!(
            parse_value("", DataType::Utf8, false),
            Some(Scalar::Str(String::new()))
        );
    }

    #[test]
    fn typed_cells() {
        assert_eq!(parse_value(" 42 ", DataType::Int32, true), Some(Scalar::I32(42)));
        assert_eq!(parse_value("Y", DataType::Boolean, true), Some(Scalar::Bool(true)));
        assert_eq!(parse_value("x1", DataType::Int64, true), None);
        assert_eq!(
            parse_value("0x00ff", DataType::Binary, true),
            Some(Scalar::Bin(vec![0, 255]))
        );
        assert_eq!(parse_value("abc", DataType::Binary, true), None);
        assert!(matches!(
            parse_value("NaN", DataType::Float64, true),
            Some(Scalar::F64(f)) if f.is_nan()
        ));
        assert_eq!(
            parse_value("1.10", DataType::Decimal, true),
            Some(Scalar::Decimal(BigDecimal::from_str("1.10").unwrap()))
        );
    }

    #[test]
    fn timestamps_keep_fractions() {
        let ts = parse_timestamp("2024-03-01T10:00:00.000000123Z").unwrap();
        assert_eq!(ts.nanosecond(), 123);
        let again = parse_timestamp(&format_value(&Scalar::Timestamp(ts))).unwrap();
        assert_eq!(again, ts);
        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn json_forms() {
        assert_eq!(
            to_json(&Scalar::Decimal(BigDecimal::from_str("0.1").unwrap())),
            serde_json::json!("0.1")
        );
        assert_eq!(to_json(&Scalar::Bin(vec![0xab])), serde_json::json!("ab"));
        assert_eq!(to_json(&Scalar::F64(f64::NAN)), serde_json::Value::Null);
    }
}
