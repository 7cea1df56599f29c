//! Sort directives and comparators.
//!
//! Two comparators are available:
//!
//! - [`SortMode::Typed`] orders numbers numerically, dates chronologically
//!   and text lexically. This is the default.
//! - [`SortMode::Lexical`] compares the display strings of both values unless
//!   they are strictly equal, so `"10"` sorts before `"2"`. Kept for output
//!   that has to match grids built on the string comparator.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::ParseError;
use crate::record::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Header indicator
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" | "up" => Ok(SortDirection::Asc),
            "desc" | "descending" | "down" => Ok(SortDirection::Desc),
            _ => Err(ParseError::UnknownDirection(s.to_string())),
        }
    }
}

/// Which comparator a view sorts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Typed,
    Lexical,
}

impl FromStr for SortMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "typed" => Ok(SortMode::Typed),
            "lexical" | "string" => Ok(SortMode::Lexical),
            _ => Err(ParseError::UnknownSortMode(s.to_string())),
        }
    }
}

/// The single active (column, direction) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Desc)
    }

    /// Order two records by this directive's column.
    pub fn compare(&self, a: &Record, b: &Record, mode: SortMode) -> Ordering {
        let ordering = compare_values(a.get(&self.column), b.get(&self.column), mode);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirective {
    type Err = ParseError;

    /// `column` or `column:asc` / `column:desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match s.rsplit_once(':') {
            Some((column, dir)) => (column, dir.parse()?),
            None => (s, SortDirection::Asc),
        };
        if column.is_empty() {
            return Err(ParseError::MissingColumn);
        }
        Ok(Self::new(column, direction))
    }
}

/// Ascending comparison of two field values.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Lexical => compare_lexical(a, b),
        SortMode::Typed => compare_typed(a, b),
    }
}

fn compare_lexical(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let a = a.map(ToString::to_string).unwrap_or_default();
    let b = b.map(ToString::to_string).unwrap_or_default();
    a.cmp(&b)
}

fn compare_typed(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_f64(*x, *y),
        (Some(Value::Date(x)), Some(Value::Date(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        (Some(x), Some(y)) => kind_rank(x).cmp(&kind_rank(y)),
    }
}

/// NaN sorts after every number; -0 and 0 are equal.
fn compare_f64(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Date(_) => 3,
        Value::Text(_) => 4,
    }
}

/// Stable in-place sort of a row set. `None` keeps the current order.
pub fn sort_rows(rows: &mut [&Record], directive: Option<&SortDirective>, mode: SortMode) {
    if let Some(directive) = directive {
        rows.sort_by(|a, b| directive.compare(a, b, mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn names(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|r| r.display("name")).collect()
    }

    fn values(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|r| r.display("value")).collect()
    }

    #[test]
    fn test_sort_by_name() {
        let records = vec![
            Record::new().with("name", "Item 3"),
            Record::new().with("name", "Item 1"),
            Record::new().with("name", "Item 2"),
        ];
        for mode in [SortMode::Typed, SortMode::Lexical] {
            let mut rows: Vec<&Record> = records.iter().collect();
            sort_rows(&mut rows, Some(&SortDirective::asc("name")), mode);
            assert_eq!(names(&rows), vec!["Item 1", "Item 2", "Item 3"]);

            sort_rows(&mut rows, Some(&SortDirective::desc("name")), mode);
            assert_eq!(names(&rows), vec!["Item 3", "Item 2", "Item 1"]);
        }
    }

    #[test]
    fn test_lexical_mode_sorts_numbers_as_strings() {
        let records = vec![
            Record::new().with("value", 2),
            Record::new().with("value", 10),
            Record::new().with("value", 1),
        ];
        let mut rows: Vec<&Record> = records.iter().collect();
        sort_rows(&mut rows, Some(&SortDirective::asc("value")), SortMode::Lexical);
        assert_eq!(values(&rows), vec!["1", "10", "2"]);
    }

    #[test]
    fn test_typed_mode_sorts_numbers_numerically() {
        let records = vec![
            Record::new().with("value", 2),
            Record::new().with("value", 10),
            Record::new().with("value", 1),
        ];
        let mut rows: Vec<&Record> = records.iter().collect();
        sort_rows(&mut rows, Some(&SortDirective::asc("value")), SortMode::Typed);
        assert_eq!(values(&rows), vec!["1", "2", "10"]);
    }

    #[test]
    fn test_typed_mode_dates() {
        let d = |m| Value::from(NaiveDate::from_ymd_opt(2024, m, 1).unwrap());
        let records = vec![
            Record::new().with("when", d(11)),
            Record::new().with("when", d(2)),
        ];
        let mut rows: Vec<&Record> = records.iter().collect();
        sort_rows(&mut rows, Some(&SortDirective::asc("when")), SortMode::Typed);
        assert_eq!(rows[0].display("when"), "2024-02-01");
    }

    #[test]
    fn test_missing_values_sort_first_ascending() {
        let records = vec![
            Record::new().with("name", "b").with("value", 5),
            Record::new().with("name", "a"),
            Record::new().with("name", "c").with("value", Value::Null),
        ];
        for mode in [SortMode::Typed, SortMode::Lexical] {
            let mut rows: Vec<&Record> = records.iter().collect();
            sort_rows(&mut rows, Some(&SortDirective::asc("value")), mode);
            assert_eq!(names(&rows), vec!["a", "c", "b"], "{mode:?}");
        }
    }

    #[test]
    fn test_no_directive_keeps_order() {
        let records = vec![
            Record::new().with("name", "z"),
            Record::new().with("name", "a"),
        ];
        let mut rows: Vec<&Record> = records.iter().collect();
        sort_rows(&mut rows, None, SortMode::Typed);
        assert_eq!(names(&rows), vec!["z", "a"]);
    }

    #[test]
    fn test_equal_values_keep_relative_order() {
        let records = vec![
            Record::new().with("name", "first").with("group", "x"),
            Record::new().with("name", "second").with("group", "x"),
            Record::new().with("name", "third").with("group", "a"),
        ];
        let mut rows: Vec<&Record> = records.iter().collect();
        sort_rows(&mut rows, Some(&SortDirective::asc("group")), SortMode::Lexical);
        assert_eq!(names(&rows), vec!["third", "first", "second"]);
    }

    #[test]
    fn test_mixed_kinds_are_totally_ordered() {
        let records = vec![
            Record::new().with("v", "10a"),
            Record::new().with("v", 9),
            Record::new().with("v", true),
            Record::new().with("v", 10),
            Record::new().with("v", f64::NAN),
        ];
        let mut rows: Vec<&Record> = records.iter().collect();
        sort_rows(&mut rows, Some(&SortDirective::asc("v")), SortMode::Typed);
        let shown: Vec<String> = rows.iter().map(|r| r.display("v")).collect();
        assert_eq!(shown, vec!["true", "9", "10", "NaN", "10a"]);
    }

    #[test]
    fn test_parse_directive() {
        assert_eq!(
            "value:desc".parse::<SortDirective>(),
            Ok(SortDirective::desc("value"))
        );
        assert_eq!("name".parse::<SortDirective>(), Ok(SortDirective::asc("name")));
        assert!("name:sideways".parse::<SortDirective>().is_err());
        assert_eq!(":asc".parse::<SortDirective>(), Err(ParseError::MissingColumn));
    }

    #[test]
    fn test_toggle() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
    }
}
