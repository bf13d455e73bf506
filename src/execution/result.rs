//! Row conversion between polars frames and JSON records

use crate::error::{AgentError, Result};
use polars::prelude::*;
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Convert every row of a DataFrame into a JSON record keyed by column name
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<Record>> {
    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let mut rows = Vec::with_capacity(df.height());

    for row_idx in 0..df.height() {
        let mut row = Map::new();
        for col_name in &columns {
            let series = df.column(col_name)?;
            row.insert(col_name.clone(), series_to_json_value(series, row_idx)?);
        }
        rows.push(row);
    }

    Ok(rows)
}

pub fn series_to_json_value(series: &Series, row_idx: usize) -> Result<Value> {
    let any_val = series
        .get(row_idx)
        .map_err(|e| AgentError::Execution(format!("Failed to get value: {}", e)))?;

    Ok(any_value_to_json(&any_val))
}

pub fn any_value_to_json(any_val: &AnyValue) -> Value {
    match any_val {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::Int8(i) => Value::Number((*i).into()),
        AnyValue::Int16(i) => Value::Number((*i).into()),
        AnyValue::Int32(i) => Value::Number((*i).into()),
        AnyValue::Int64(i) => Value::Number((*i).into()),
        AnyValue::UInt8(u) => Value::Number((*u).into()),
        AnyValue::UInt16(u) => Value::Number((*u).into()),
        AnyValue::UInt32(u) => Value::Number((*u).into()),
        AnyValue::UInt64(u) => Value::Number((*u).into()),
        AnyValue::Float32(f) => float_to_json(*f as f64),
        AnyValue::Float64(f) => float_to_json(*f),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_to_records() {
        let df = df![
            "Address" => ["https://a.example/", "https://b.example/"],
            "Inlinks" => [Some(3i64), None],
            "Ratio" => [0.5f64, 1.25]
        ]
        .unwrap();
        let rows = frame_to_records(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Address"], json!("https://a.example/"));
        assert_eq!(rows[0]["Inlinks"], json!(3));
        assert_eq!(rows[1]["Inlinks"], Value::Null);
        assert_eq!(rows[1]["Ratio"], json!(1.25));
    }
}
