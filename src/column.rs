//! Column descriptors.
//!
//! A column names a record field to display. Columns come either from the
//! `[[columns]]` table of the config file, from `--columns` on the command
//! line, or are inferred from the loaded records.
//!
//! ```text
//! config / CLI / records
//!        │
//!        ▼
//!   Column list (this module)
//!        │
//!        ├──▶ TableView (sortable flag only)
//!        │
//!        ▼
//!   TUI header / plain-text printer
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::record::Record;

/// A field to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Record field this column reads
    pub key: String,
    /// Header text; derived from the key when omitted
    #[serde(default)]
    pub label: String,
    /// Whether a sort directive may target this column
    #[serde(default = "default_sortable")]
    pub sortable: bool,
    /// Preferred width in cells (presentational only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
}

fn default_sortable() -> bool {
    true
}

impl Column {
    /// Sortable column with a label derived from the key.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: label_from_key(&key),
            key,
            sortable: true,
            width: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    /// Fill in a missing label after deserializing.
    pub fn normalized(mut self) -> Self {
        if self.label.is_empty() {
            self.label = label_from_key(&self.key);
        }
        self
    }
}

/// `created_at` → `Created At`, `firstName` → `First Name`
pub fn label_from_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Union of every field name in `records`, sorted, as sortable columns.
pub fn infer_columns(records: &[Record]) -> Vec<Column> {
    let keys: BTreeSet<&str> = records.iter().flat_map(|r| r.keys()).collect();
    keys.into_iter().map(Column::new).collect()
}

/// Parse a `--columns name,category,value` list.
pub fn parse_column_list(list: &str) -> Vec<Column> {
    list.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(Column::new)
        .collect()
}
