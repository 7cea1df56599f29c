use serde_json::Map;
use std::io;
use std::path::{Path, PathBuf};

use crate::record::{Record, Value};

/// Errors loading a data file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a top-level JSON array of objects")]
    NotAnArray,
    #[error("array element {0} is not an object")]
    NotAnObject(usize),
}

/// On-disk layout of a data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// A single JSON array of objects
    Json,
    /// One JSON object per line
    JsonLines,
}

impl DataFormat {
    /// Pick a format from the file extension, falling back to sniffing.
    pub fn detect(path: &Path, content: &str) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => DataFormat::Json,
            Some("jsonl") | Some("ndjson") => DataFormat::JsonLines,
            _ => Self::sniff(content),
        }
    }

    fn sniff(content: &str) -> Self {
        if content.trim_start().starts_with('[') {
            DataFormat::Json
        } else {
            DataFormat::JsonLines
        }
    }
}

/// Options applied while converting JSON into records
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Turn ISO date strings into `Value::Date`
    pub detect_dates: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { detect_dates: true }
    }
}

/// Load every record from a data file
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Vec<Record>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = DataFormat::detect(path, &content);
    tracing::debug!("Loading {} as {:?}", path.display(), format);

    let records = match format {
        DataFormat::Json => parse_json_array(&content, options)?,
        DataFormat::JsonLines => parse_json_lines(&content, options),
    };

    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse a top-level JSON array of objects
pub fn parse_json_array(content: &str, options: &LoadOptions) -> Result<Vec<Record>, LoadError> {
    let json: serde_json::Value = serde_json::from_str(content)?;
    let serde_json::Value::Array(items) = json else {
        return Err(LoadError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(map) => Ok(record_from_object(map, options)),
            _ => Err(LoadError::NotAnObject(index)),
        })
        .collect()
}

/// Parse JSON Lines. Blank lines are ignored; bad lines are logged and
/// skipped.
pub fn parse_json_lines(content: &str, options: &LoadOptions) -> Vec<Record> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(serde_json::Value::Object(map)) => {
                records.push(record_from_object(map, options));
            }
            Ok(_) => {
                tracing::warn!("Skipping line {}: not a JSON object", idx + 1);
            }
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", idx + 1, e);
            }
        }
    }

    records
}

fn record_from_object(map: Map<String, serde_json::Value>, options: &LoadOptions) -> Record {
    map.into_iter()
        .map(|(key, json)| {
            let value = Value::from_json(json);
            let value = if options.detect_dates {
                value.detect_date()
            } else {
                value
            };
            (key, value)
        })
        .collect()
}
