//! Classify a transformation's output frame into an agent result

use crate::agents::result::AgentResult;
use crate::error::Result;
use crate::execution::result::{any_value_to_json, frame_to_records};
use crate::execution::sandbox::ResultKind;
use polars::prelude::*;
use serde_json::{Number, Value};

/// Rows kept in a text rendering
const RENDERED_ROWS: usize = 10;

/// Build the agent result for `frame`, honouring the declared kind when there
/// is one. Without a declaration a single numeric cell is a metric and
/// everything else a table.
pub fn classify(frame: DataFrame, declared: Option<ResultKind>, structured: bool) -> Result<AgentResult> {
    let kind = declared.unwrap_or_else(|| infer_kind(&frame));

    match kind {
        ResultKind::Metric => Ok(metric_or_unknown(&frame)),
        ResultKind::Series if frame.width() <= 2 && frame.width() > 0 => {
            let frame = with_index_column(frame)?;
            let count = series_count(&frame)?;
            tabulate(frame, count, structured)
        }
        _ => {
            let count = Number::from(frame.height());
            tabulate(frame, count, structured)
        }
    }
}

fn infer_kind(frame: &DataFrame) -> ResultKind {
    if is_single_numeric_cell(frame) {
        ResultKind::Metric
    } else {
        ResultKind::Table
    }
}

fn is_single_numeric_cell(frame: &DataFrame) -> bool {
    frame.shape() == (1, 1) && frame.get_columns()[0].dtype().is_numeric()
}

fn metric_or_unknown(frame: &DataFrame) -> AgentResult {
    if is_single_numeric_cell(frame) {
        let value = frame.get_columns()[0]
            .cast(&DataType::Float64)
            .ok()
            .and_then(|s| s.f64().ok().and_then(|ca| ca.get(0)));
        if let Some(result) = value {
            return AgentResult::Metric { result };
        }
    }
    AgentResult::Unknown {
        result: render_unknown(frame),
    }
}

fn render_unknown(frame: &DataFrame) -> String {
    if frame.shape() == (1, 1) {
        if let Ok(value) = frame.get_columns()[0].get(0) {
            return match any_value_to_json(&value) {
                Value::String(s) => s,
                other => other.to_string(),
            };
        }
    }
    frame.to_string()
}

/// A one-column series gets its positional index back as a leading column
fn with_index_column(frame: DataFrame) -> Result<DataFrame> {
    if frame.width() != 1 {
        return Ok(frame);
    }
    let values = frame.get_columns()[0].clone();
    let index_name = if values.name() == "index" { "position" } else { "index" };
    let index = Series::new(index_name, (0..frame.height() as u64).collect::<Vec<u64>>());
    Ok(DataFrame::new(vec![index, values])?)
}

/// Sum of the value column when numeric, else the number of entries
fn series_count(frame: &DataFrame) -> Result<Number> {
    let values = &frame.get_columns()[frame.width() - 1];
    if !values.dtype().is_numeric() {
        return Ok(Number::from(frame.height()));
    }
    let total: f64 = values
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .flatten()
        .sum();
    Ok(number_from_f64(total))
}

fn number_from_f64(value: f64) -> Number {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Number::from(value as i64)
    } else {
        Number::from_f64(value).unwrap_or_else(|| Number::from(0))
    }
}

fn tabulate(frame: DataFrame, count: Number, structured: bool) -> Result<AgentResult> {
    if structured {
        Ok(AgentResult::Table {
            results: frame_to_records(&frame)?,
            count,
        })
    } else {
        Ok(AgentResult::Rendered {
            results: frame.head(Some(RENDERED_ROWS)).to_string(),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_counts_rows() {
        let frame = df!["Address" => ["a", "b", "c"], "Words" => [1i64, 2, 3]].unwrap();
        match classify(frame, Some(ResultKind::Table), true).unwrap() {
            AgentResult::Table { results, count } => {
                assert_eq!(results.len(), 3);
                assert_eq!(count, Number::from(3));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_numeric_series_counts_sum() {
        let frame = df!["Status Code" => [200i64, 404], "pages" => [7i64, 2]].unwrap();
        match classify(frame, Some(ResultKind::Series), true).unwrap() {
            AgentResult::Table { results, count } => {
                assert_eq!(count, Number::from(9));
                assert_eq!(results[1]["Status Code"], json!(404));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_single_column_series_recovers_index() {
        let frame = df!["Title" => ["Home", "About"]].unwrap();
        match classify(frame, Some(ResultKind::Series), true).unwrap() {
            AgentResult::Table { results, count } => {
                assert_eq!(count, Number::from(2));
                assert_eq!(results[1]["index"], json!(1));
                assert_eq!(results[1]["Title"], json!("About"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_inferred_metric() {
        let frame = df!["n" => [42i64]].unwrap();
        assert_eq!(classify(frame, None, true).unwrap(), AgentResult::Metric { result: 42.0 });
    }

    #[test]
    fn test_declared_metric_with_text_is_unknown() {
        let frame = df!["title" => ["Home"]].unwrap();
        assert_eq!(
            classify(frame, Some(ResultKind::Metric), true).unwrap(),
            AgentResult::Unknown { result: "Home".to_string() }
        );
    }

    #[test]
    fn test_unstructured_rendering() {
        let frame = df!["n" => (0..25i64).collect::<Vec<_>>(), "m" => (0..25i64).collect::<Vec<_>>()].unwrap();
        match classify(frame, None, false).unwrap() {
            AgentResult::Rendered { count, .. } => assert_eq!(count, Number::from(25)),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
