//! Filter evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseError;
use crate::record::{Record, Value};

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Contains,
        FilterOperator::Equals,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
    ];

    /// Operators comparing numbers rather than lower-cased text
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FilterOperator::Gt | FilterOperator::Lt | FilterOperator::Gte | FilterOperator::Lte
        )
    }

    /// Next operator in [`FilterOperator::ALL`], wrapping around.
    pub fn cycle(self) -> Self {
        let idx = Self::ALL.iter().position(|op| *op == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Short symbol for status lines
    pub fn symbol(self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::Contains => "~",
            FilterOperator::StartsWith => "^",
            FilterOperator::EndsWith => "$",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equals" | "eq" | "=" | "==" => Ok(FilterOperator::Equals),
            "contains" | "~" => Ok(FilterOperator::Contains),
            "startswith" | "starts_with" | "starts-with" | "^" => Ok(FilterOperator::StartsWith),
            "endswith" | "ends_with" | "ends-with" | "$" => Ok(FilterOperator::EndsWith),
            "gt" | ">" => Ok(FilterOperator::Gt),
            "lt" | "<" => Ok(FilterOperator::Lt),
            "gte" | ">=" => Ok(FilterOperator::Gte),
            "lte" | "<=" => Ok(FilterOperator::Lte),
            _ => Err(ParseError::UnknownOperator(s.to_string())),
        }
    }
}

/// A predicate on one record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    #[serde(with = "tagged_value")]
    pub value: Value,
    #[serde(default)]
    pub operator: FilterOperator,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<Value>, operator: FilterOperator) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            operator,
        }
    }

    /// Filter with the default `contains` operator
    pub fn contains(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, FilterOperator::Contains)
    }

    /// A filter with a null or empty value takes no part in evaluation.
    pub fn is_active(&self) -> bool {
        !self.value.is_blank()
    }

    /// Test a single field value against this filter.
    ///
    /// Absent and null items never match, whatever the operator.
    pub fn matches(&self, item: Option<&Value>) -> bool {
        let item = match item {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        // Comparisons involving NaN are false, so bad numeric input drops out
        let numbers = || numeric_pair(item, &self.value);
        let texts = || (item.to_string().to_lowercase(), self.value.to_string().to_lowercase());

        match self.operator {
            FilterOperator::Gt => {
                let (lhs, rhs) = numbers();
                lhs > rhs
            }
            FilterOperator::Lt => {
                let (lhs, rhs) = numbers();
                lhs < rhs
            }
            FilterOperator::Gte => {
                let (lhs, rhs) = numbers();
                lhs >= rhs
            }
            FilterOperator::Lte => {
                let (lhs, rhs) = numbers();
                lhs <= rhs
            }
            FilterOperator::Equals => {
                let (haystack, needle) = texts();
                haystack == needle
            }
            FilterOperator::Contains => {
                let (haystack, needle) = texts();
                haystack.contains(&needle)
            }
            FilterOperator::StartsWith => {
                let (haystack, needle) = texts();
                haystack.starts_with(&needle)
            }
            FilterOperator::EndsWith => {
                let (haystack, needle) = texts();
                haystack.ends_with(&needle)
            }
        }
    }

    /// Test a record: looks up `self.key` and delegates to [`Filter::matches`].
    pub fn matches_record(&self, record: &Record) -> bool {
        self.matches(record.get(&self.key))
    }
}

/// Coerce both sides of an ordering comparison to numbers.
///
/// A date on one side pulls date text on the other side through the date
/// parser so `2024-01-01` can bound a date column.
fn numeric_pair(item: &Value, target: &Value) -> (f64, f64) {
    match (item, target) {
        (Value::Date(_), Value::Text(_)) | (Value::Text(_), Value::Date(_)) => {
            let lhs = item.to_date().map(date_millis).unwrap_or(f64::NAN);
            let rhs = target.to_date().map(date_millis).unwrap_or(f64::NAN);
            (lhs, rhs)
        }
        _ => (item.to_number(), target.to_number()),
    }
}

fn date_millis(dt: chrono::NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64
}

/// Filter values carry their type on disk, so date-like text stays text and
/// non-finite numbers survive JSON. Untyped values from older session files
/// are still accepted.
mod tagged_value {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::record::Value;

    #[derive(Serialize, Deserialize)]
    #[serde(tag = "type", content = "value", rename_all = "lowercase")]
    enum Tagged {
        Null,
        Bool(bool),
        Number(#[serde(with = "number")] f64),
        Date(NaiveDateTime),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Tagged(Tagged),
        Plain(Value),
    }

    impl From<Tagged> for Value {
        fn from(tagged: Tagged) -> Self {
            match tagged {
                Tagged::Null => Value::Null,
                Tagged::Bool(b) => Value::Bool(b),
                Tagged::Number(n) => Value::Number(n),
                Tagged::Date(dt) => Value::Date(dt),
                Tagged::Text(s) => Value::Text(s),
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
        let tagged = match value {
            Value::Null => Tagged::Null,
            Value::Bool(b) => Tagged::Bool(*b),
            Value::Number(n) => Tagged::Number(*n),
            Value::Date(dt) => Tagged::Date(*dt),
            Value::Text(s) => Tagged::Text(s.clone()),
        };
        tagged.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        Ok(match Stored::deserialize(deserializer)? {
            Stored::Tagged(tagged) => tagged.into(),
            Stored::Plain(value) => value,
        })
    }

    /// Finite numbers as JSON numbers, `NaN` and the infinities as text
    mod number {
        use serde::{Deserialize, Deserializer, Serializer};

        use crate::record::{parse_number, Value};

        pub fn serialize<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            if n.is_finite() {
                serializer.serialize_f64(*n)
            } else {
                serializer.serialize_str(&Value::Number(*n).to_string())
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Repr {
                Number(f64),
                Text(String),
            }

            Ok(match Repr::deserialize(deserializer)? {
                Repr::Number(n) => n,
                Repr::Text(s) => parse_number(&s),
            })
        }
    }
}

/// Keep the records passing every active filter, in their original order.
pub fn filter_rows<'a>(records: &'a [Record], filters: &[Filter]) -> Vec<&'a Record> {
    let active: Vec<&Filter> = filters.iter().filter(|f| f.is_active()).collect();
    records
        .iter()
        .filter(|record| active.iter().all(|f| f.matches_record(record)))
        .collect()
}

/// Indices of the records passing every active filter.
pub(crate) fn filter_indices(records: &[Record], filters: &[Filter]) -> Vec<usize> {
    let active: Vec<&Filter> = filters.iter().filter(|f| f.is_active()).collect();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| active.iter().all(|f| f.matches_record(record)))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn test_string_operators_case_insensitive() {
        let item = text("Hello World");
        assert!(Filter::new("k", "hello world", FilterOperator::Equals).matches(Some(&item)));
        assert!(Filter::new("k", "LO wo", FilterOperator::Contains).matches(Some(&item)));
        assert!(Filter::new("k", "HELLO", FilterOperator::StartsWith).matches(Some(&item)));
        assert!(Filter::new("k", "WORLD", FilterOperator::EndsWith).matches(Some(&item)));
        assert!(!Filter::new("k", "world", FilterOperator::StartsWith).matches(Some(&item)));
    }

    #[test]
    fn test_numbers_match_as_text_for_string_operators() {
        let item = Value::from(100);
        assert!(Filter::contains("k", "1").matches(Some(&item)));
        assert!(Filter::new("k", "100", FilterOperator::Equals).matches(Some(&item)));
        assert!(!Filter::new("k", "100.0", FilterOperator::Equals).matches(Some(&item)));
    }

    #[test]
    fn test_numeric_operators() {
        let item = Value::from(100);
        assert!(Filter::new("k", 50, FilterOperator::Gt).matches(Some(&item)));
        assert!(Filter::new("k", "50", FilterOperator::Gt).matches(Some(&item)));
        assert!(!Filter::new("k", 100, FilterOperator::Gt).matches(Some(&item)));
        assert!(Filter::new("k", 100, FilterOperator::Gte).matches(Some(&item)));
        assert!(Filter::new("k", 100, FilterOperator::Lte).matches(Some(&item)));
        assert!(Filter::new("k", 101, FilterOperator::Lt).matches(Some(&item)));
    }

    #[test]
    fn test_numeric_text_item() {
        let item = text(" 20 ");
        assert!(Filter::new("k", 3, FilterOperator::Gt).matches(Some(&item)));
    }

    #[test]
    fn test_non_numeric_input_never_matches() {
        let item = Value::from(100);
        for op in [
            FilterOperator::Gt,
            FilterOperator::Lt,
            FilterOperator::Gte,
            FilterOperator::Lte,
        ] {
            assert!(!Filter::new("k", "abc", op).matches(Some(&item)));
            assert!(!Filter::new("k", 5, op).matches(Some(&text("n/a"))));
        }
    }

    #[test]
    fn test_null_and_absent_never_match() {
        for op in FilterOperator::ALL {
            let filter = Filter::new("value", 50, op);
            assert!(!filter.matches(Some(&Value::Null)), "{op} matched null");
            assert!(!filter.matches(None), "{op} matched absent");
        }
    }

    #[test]
    fn test_date_range() {
        let item = Value::from(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(Filter::new("d", "2024-01-01", FilterOperator::Gte).matches(Some(&item)));
        assert!(!Filter::new("d", "2024-12-31", FilterOperator::Gt).matches(Some(&item)));
        assert!(Filter::new("d", "2024-06", FilterOperator::Contains).matches(Some(&item)));
    }

    #[test]
    fn test_inert_filters() {
        assert!(!Filter::contains("k", "").is_active());
        assert!(!Filter::contains("k", Value::Null).is_active());
        assert!(Filter::contains("k", 0).is_active());
        assert!(Filter::contains("k", false).is_active());
    }

    #[test]
    fn test_filter_rows_is_conjunction() {
        let records = vec![
            Record::new().with("category", "A").with("value", 100),
            Record::new().with("category", "B").with("value", 200),
            Record::new().with("category", "A").with("value", 150),
        ];
        let filters = vec![Filter::contains("category", "A"), Filter::contains("value", "100")];
        let rows = filter_rows(&records, &filters);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], &records[0]);
    }

    #[test]
    fn test_filter_rows_skips_inert() {
        let records = vec![Record::new().with("a", 1), Record::new().with("a", 2)];
        let filters = vec![Filter::contains("a", ""), Filter::contains("b", Value::Null)];
        assert_eq!(filter_rows(&records, &filters).len(), 2);
        assert_eq!(filter_indices(&records, &filters), vec![0, 1]);
    }

    #[test]
    fn test_operator_parse_and_cycle() {
        assert_eq!("startsWith".parse::<FilterOperator>(), Ok(FilterOperator::StartsWith));
        assert_eq!(">=".parse::<FilterOperator>(), Ok(FilterOperator::Gte));
        assert!("between".parse::<FilterOperator>().is_err());

        let mut op = FilterOperator::default();
        for _ in 0..FilterOperator::ALL.len() {
            op = op.cycle();
        }
        assert_eq!(op, FilterOperator::Contains);
    }

    #[test]
    fn test_filter_value_keeps_type_through_json() {
        let filters = vec![
            Filter::new("when", "2024-01-01T00:00:00", FilterOperator::Gt),
            Filter::new("n", f64::NAN, FilterOperator::Lt),
            Filter::new("n", f64::INFINITY, FilterOperator::Lt),
            Filter::new("d", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), FilterOperator::Gte),
            Filter::new("b", false, FilterOperator::Equals),
        ];
        let json = serde_json::to_string(&filters).unwrap();
        let back: Vec<Filter> = serde_json::from_str(&json).unwrap();

        assert_eq!(back[0].value, text("2024-01-01T00:00:00"));
        assert!(matches!(back[1].value, Value::Number(n) if n.is_nan()));
        assert_eq!(back[2].value, Value::Number(f64::INFINITY));
        assert_eq!(back[3], filters[3]);
        assert_eq!(back[4], filters[4]);
    }

    #[test]
    fn test_filter_reads_untyped_value() {
        let json = r#"{"key": "name", "value": "item", "operator": "startsWith"}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter, Filter::new("name", "item", FilterOperator::StartsWith));

        let json = r#"{"key": "n", "value": 5}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.value, Value::Number(5.0));
        assert_eq!(filter.operator, FilterOperator::Contains);
    }

    #[test]
    fn test_operator_serde_names() {
        let json = serde_json::to_string(&FilterOperator::StartsWith).unwrap();
        assert_eq!(json, "\"startsWith\"");
    }
}
