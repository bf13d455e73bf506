//! Agent result envelopes

use crate::error::AgentError;
use crate::execution::result::Record;
use crate::plan::QueryPlan;
use crate::services::reporting::ReportRow;
use serde::Serialize;
use serde_json::Number;

/// Output of one agent invocation, consumed once by the orchestrator.
///
/// Serialized untagged so each variant reads as a plain JSON object; an error
/// is always an object with an `error` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentResult {
    /// Structured-query execution with the plan that produced it
    Report(ReportOutcome),
    Table { results: Vec<Record>, count: Number },
    /// Text rendering of the first rows, for unstructured callers
    Rendered { results: String, count: Number },
    Metric { result: f64 },
    Error(AgentFailure),
    Unknown { result: String },
}

impl AgentResult {
    pub fn error(message: impl Into<String>) -> Self {
        AgentResult::Error(AgentFailure::message(message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AgentResult::Error(_))
    }

    pub fn failure(&self) -> Option<&AgentFailure> {
        match self {
            AgentResult::Error(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub plan: QueryPlan,
    pub row_count: usize,
    pub rows: Vec<ReportRow>,
    pub dimension_headers: Vec<String>,
    pub metric_headers: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentFailure {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_metrics: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_dimensions: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl AgentFailure {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: None,
            invalid_metrics: Vec::new(),
            invalid_dimensions: Vec::new(),
            hint: None,
            raw_output: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<&AgentError> for AgentFailure {
    fn from(err: &AgentError) -> Self {
        let mut failure = AgentFailure::message(err.to_string());
        failure.kind = Some(err.kind().to_string());
        match err {
            AgentError::Extraction { raw, .. } => {
                failure.raw_output = Some(raw.clone());
            }
            AgentError::FieldMapping {
                invalid_metrics,
                invalid_dimensions,
            } => {
                failure.invalid_metrics = invalid_metrics.clone();
                failure.invalid_dimensions = invalid_dimensions.clone();
            }
            _ => {}
        }
        failure
    }
}

impl From<AgentError> for AgentResult {
    fn from(err: AgentError) -> Self {
        AgentResult::Error(AgentFailure::from(&err))
    }
}
