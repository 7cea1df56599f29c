//! Records and field values.
//!
//! A [`Record`] is one row of tabular data: an open-ended map from field name
//! to [`Value`]. There is no schema. Looking up a field that a record does not
//! carry returns `None`, and every consumer treats that exactly like an
//! explicit [`Value::Null`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single field value.
///
/// Serialized untagged, with `Date` listed before `Text` so ISO datetime
/// strings read as dates. Filter values use a typed form instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Build a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Null` and the empty string. Filters carrying such a value
    /// are ignored.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion used by the ordering filter operators.
    ///
    /// Mirrors script-style `Number(x)`: text is trimmed, the empty string is
    /// zero, `0x`/`0o`/`0b` literals are accepted, anything else that does not
    /// parse is `NaN`. Dates become epoch milliseconds.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Date(dt) => dt.and_utc().timestamp_millis() as f64,
            Value::Text(s) => parse_number(s),
        }
    }

    /// Interpret this value as a date, parsing text if needed.
    pub fn to_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Convert a JSON value. Nested arrays and objects are kept as their
    /// compact JSON text.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }

    /// Turn ISO date text into a `Date` value; everything else is unchanged.
    pub fn detect_date(self) -> Self {
        match self {
            Value::Text(s) => match parse_date(&s) {
                Some(dt) => Value::Date(dt),
                None => Value::Text(s),
            },
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write_number(f, *n),
            Value::Date(dt) => {
                if dt.time() == NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))
                }
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // -0 prints as 0
        f.write_str("0")
    } else {
        write!(f, "{}", n)
    }
}

/// Script-style numeric parsing of text.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    const RADIX_PREFIXES: &[(&str, u32)] = &[
        ("0x", 16),
        ("0X", 16),
        ("0o", 8),
        ("0O", 8),
        ("0b", 2),
        ("0B", 2),
    ];
    for (prefix, radix) in RADIX_PREFIXES {
        if let Some(digits) = t.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(*radix)) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, *radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust also accepts "inf" and "nan"; restrict to plain decimal syntax
    let decimal = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal {
        return f64::NAN;
    }
    t.parse().unwrap_or(f64::NAN)
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (or with a space) and
/// RFC 3339 timestamps. Offsets are normalised to UTC.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let t = s.trim();
    // Cheap reject before trying every format
    if t.len() < 10 || !t.as_bytes()[0].is_ascii_digit() {
        return None;
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One row of tabular data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Field lookup. `None` means the record does not carry the field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Display form of a field; absent and null fields render empty.
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::from(100).to_string(), "100");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_display_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::from(day).to_string(), "2024-03-09");

        let dt = day.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(Value::from(dt).to_string(), "2024-03-09T14:05:00");
    }

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(Value::Null.to_string(), "");
        let record = Record::new().with("a", Value::Null);
        assert_eq!(record.display("a"), "");
        assert_eq!(record.display("missing"), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number("  3.25 "), 3.25);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("0x1F"), 31.0);
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("12px").is_nan());
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("0xZZ").is_nan());
    }

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Bool(false).to_number(), 0.0);
        assert_eq!(Value::text("50").to_number(), 50.0);

        let epoch = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(Value::from(epoch).to_number(), 86_400_000.0);
    }

    #[test]
    fn test_parse_date() {
        let d = parse_date("2024-01-15").unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        assert!(parse_date("2024-01-15T10:30:00").is_some());
        assert!(parse_date("2024-01-15 10:30:00.250").is_some());
        assert!(parse_date("2024-01-15T10:30:00+02:00").is_some());
        assert!(parse_date("Item 1").is_none());
        assert!(parse_date("2024-13-01").is_none());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(serde_json::json!(null)), Value::Null);
        assert_eq!(Value::from_json(serde_json::json!(7)), Value::Number(7.0));
        assert_eq!(Value::from_json(serde_json::json!("x")), Value::text("x"));
        assert_eq!(
            Value::from_json(serde_json::json!([1, 2])),
            Value::text("[1,2]")
        );
    }

    #[test]
    fn test_detect_date_leaves_plain_text() {
        assert!(matches!(Value::text("2024-05-01").detect_date(), Value::Date(_)));
        assert_eq!(Value::text("hello").detect_date(), Value::text("hello"));
        assert_eq!(Value::from(3).detect_date(), Value::Number(3.0));
    }

    #[test]
    fn test_record_lookup() {
        let record = Record::new().with("name", "Item 1").with("value", 100);
        assert_eq!(record.get("name"), Some(&Value::text("Item 1")));
        assert_eq!(record.get("nope"), None);
        assert_eq!(record.len(), 2);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name", "value"]);
    }

    #[test]
    fn test_value_session_roundtrip() {
        let record = Record::new()
            .with("n", 1.5)
            .with("s", "text")
            .with("b", true)
            .with("z", Value::Null)
            .with("d", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
