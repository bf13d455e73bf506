//! Query plan data model

use crate::catalog::FieldKind;
use crate::error::{AgentError, Result};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_START_DATE: &str = "14daysAgo";
pub const DEFAULT_END_DATE: &str = "today";

lazy_static! {
    static ref DAYS_AGO: Regex = Regex::new(r"^(\d+)daysAgo$").unwrap();
}

/// Structured reporting query, as produced by the plan generator.
///
/// Field references are kept as raw JSON until the validator normalizes them,
/// so a malformed reference is reported as a validation failure instead of a
/// parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    pub metrics: Vec<Value>,

    #[serde(default)]
    pub dimensions: Vec<Value>,

    #[serde(default)]
    pub date_ranges: Vec<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_filter: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_filter: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_bys: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_empty_rows: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_spec: Option<Value>,

    #[serde(default, alias = "aggregations", skip_serializing_if = "Option::is_none")]
    pub metric_aggregations: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_property_quota: Option<bool>,
}

impl QueryPlan {
    /// Interpret an extracted JSON object as a plan
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AgentError::Validation(format!("Plan does not have the expected shape: {}", e)))
    }

    /// Date ranges to execute, falling back to the default window
    pub fn effective_date_ranges(&self) -> Vec<DateRange> {
        if self.date_ranges.is_empty() {
            vec![DateRange::default()]
        } else {
            self.date_ranges.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default = "default_start_date")]
    pub start_date: String,

    #[serde(default = "default_end_date")]
    pub end_date: String,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
        }
    }
}

fn default_start_date() -> String {
    DEFAULT_START_DATE.to_string()
}

fn default_end_date() -> String {
    DEFAULT_END_DATE.to_string()
}

/// Relative or absolute date accepted by the reporting API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    Today,
    Yesterday,
    DaysAgo(u32),
    Date(NaiveDate),
}

impl DateToken {
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        match token {
            "today" => return Ok(DateToken::Today),
            "yesterday" => return Ok(DateToken::Yesterday),
            _ => {}
        }
        if let Some(caps) = DAYS_AGO.captures(token) {
            let days = caps[1]
                .parse::<u32>()
                .map_err(|e| AgentError::Validation(format!("Invalid date token '{}': {}", token, e)))?;
            return Ok(DateToken::DaysAgo(days));
        }
        NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .map(DateToken::Date)
            .map_err(|_| AgentError::Validation(format!("Invalid date token '{}'", token)))
    }
}

/// A metric or dimension reference: `"name"` or `{"name": "name"}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Bare(String),
    Named(String),
}

impl FieldRef {
    pub fn from_value(item: &Value, kind: FieldKind) -> Result<Self> {
        let field_ref = match item {
            Value::String(name) => FieldRef::Bare(name.clone()),
            Value::Object(map) if map.len() == 1 => match map.get("name") {
                Some(Value::String(name)) => FieldRef::Named(name.clone()),
                _ => return Err(invalid_ref(item, kind)),
            },
            _ => return Err(invalid_ref(item, kind)),
        };
        if field_ref.name().trim().is_empty() {
            return Err(AgentError::Validation(format!("Empty {} name", kind.as_str())));
        }
        Ok(field_ref)
    }

    pub fn name(&self) -> &str {
        match self {
            FieldRef::Bare(name) | FieldRef::Named(name) => name,
        }
    }

    pub fn into_name(self) -> String {
        match self {
            FieldRef::Bare(name) | FieldRef::Named(name) => name,
        }
    }
}

fn invalid_ref(item: &Value, kind: FieldKind) -> AgentError {
    AgentError::Validation(format!("Invalid {}: {}", kind.as_str(), item))
}
