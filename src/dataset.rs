//! Union Dataset
//!
//! Merges the sheets of a crawl export into one table keyed by a row-identity
//! column. Rows sharing a key collapse into one; for every column the first
//! non-empty value (in sheet order, then row order) wins. Sheets without the
//! key column are skipped.

use crate::error::Result;
use crate::execution::result::{frame_to_records, Record};
use crate::services::sheets::Sheet;
use polars::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const DEFAULT_KEY_COLUMN: &str = "Address";

/// Rows of the dataset shown to the generator as a sample
pub const SAMPLE_ROWS: usize = 20;

#[derive(Debug, Clone)]
pub struct UnionDataset {
    frame: DataFrame,
    key_column: String,
}

impl UnionDataset {
    pub fn empty(key_column: &str) -> Self {
        Self {
            frame: DataFrame::default(),
            key_column: key_column.to_string(),
        }
    }

    pub fn from_frame(frame: DataFrame, key_column: &str) -> Self {
        Self {
            frame,
            key_column: key_column.to_string(),
        }
    }

    pub fn from_sheets(sheets: Vec<Sheet>, key_column: &str) -> Result<Self> {
        let mut columns: Vec<String> = vec![key_column.to_string()];
        let mut merged: BTreeMap<String, Record> = BTreeMap::new();

        for sheet in sheets {
            if sheet.rows.is_empty() {
                debug!("Skipping empty sheet '{}'", sheet.sheet_name);
                continue;
            }
            let rows: Vec<Record> = sheet.rows.into_iter().map(trim_headers).collect();
            if !rows.iter().any(|row| row.contains_key(key_column)) {
                debug!("Skipping sheet '{}' without a '{}' column", sheet.sheet_name, key_column);
                continue;
            }

            for row in rows {
                let key = match row.get(key_column).and_then(key_string) {
                    Some(key) => key,
                    None => continue,
                };
                let entry = merged.entry(key).or_default();
                for (column, value) in row {
                    if column == key_column {
                        continue;
                    }
                    if !columns.contains(&column) {
                        columns.push(column.clone());
                    }
                    let filled = entry.get(&column).map(|v| !is_missing(v)).unwrap_or(false);
                    if !filled && !is_missing(&value) {
                        entry.insert(column, value);
                    }
                }
            }
        }

        if merged.is_empty() {
            info!("No usable sheets found; union dataset is empty");
            return Ok(Self::empty(key_column));
        }

        let keys: Vec<&String> = merged.keys().collect();
        let mut series = Vec::with_capacity(columns.len());
        series.push(Series::new(key_column, keys.iter().map(|k| k.as_str()).collect::<Vec<_>>()));
        for column in columns.iter().skip(1) {
            let values: Vec<Value> = merged
                .values()
                .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
                .collect();
            series.push(infer_series(column, &values));
        }

        let frame = DataFrame::new(series)?;
        info!("Union table built with {} unique {} values", frame.height(), key_column);
        Ok(Self::from_frame(frame, key_column))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    pub fn sample_records(&self, rows: usize) -> Result<Vec<Record>> {
        frame_to_records(&self.frame.head(Some(rows)))
    }
}

fn trim_headers(row: Record) -> Record {
    row.into_iter()
        .map(|(k, v)| (k.trim().to_string(), v))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string().trim().to_string()),
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Narrowest column type holding every present value
fn infer_series(name: &str, values: &[Value]) -> Series {
    let present: Vec<&Value> = values.iter().filter(|v| !is_missing(v)).collect();

    if !present.is_empty() && present.iter().all(|v| v.as_i64().is_some()) {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
        return Series::new(name, data);
    }
    if !present.is_empty() && present.iter().all(|v| v.is_number()) {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
        return Series::new(name, data);
    }
    if !present.is_empty() && present.iter().all(|v| v.is_boolean()) {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
        return Series::new(name, data);
    }

    let data: Vec<Option<String>> = values
        .iter()
        .map(|v| match v {
            v if is_missing(v) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name, data)
}
