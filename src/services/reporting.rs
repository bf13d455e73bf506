//! Reporting client - executes validated plans against the GA4 Data API

use crate::catalog::FieldKind;
use crate::error::{AgentError, Result};
use crate::plan::{PlanValidator, QueryPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

pub const GA4_BASE_URL: &str = "https://analyticsdata.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub dimension_headers: Vec<String>,
    #[serde(default)]
    pub metric_headers: Vec<String>,
}

#[async_trait]
pub trait ReportingClient: Send + Sync {
    async fn run_report(&self, plan: &QueryPlan, property_id: &str) -> Result<ReportResponse>;
}

/// GA4 Data API `runReport` over REST with a bearer token
pub struct Ga4Client {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl Ga4Client {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            base_url: GA4_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ReportingClient for Ga4Client {
    async fn run_report(&self, plan: &QueryPlan, property_id: &str) -> Result<ReportResponse> {
        let body = build_request_body(plan)?;
        let property_id = property_id.trim().trim_start_matches("properties/");
        info!("Running GA4 report for property {}", property_id);

        let response = self
            .http
            .post(format!("{}/properties/{}:runReport", self.base_url, property_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Execution(format!(
                "GA4 runReport failed ({}): {}",
                status, detail
            )));
        }

        let raw: RunReportResponse = response.json().await?;
        let report = raw.into_report();
        info!("GA4 report received ({} rows)", report.rows.len());
        Ok(report)
    }
}

/// Request body with normalized field names and effective date ranges.
/// Optional plan sections pass through under their API names.
pub fn build_request_body(plan: &QueryPlan) -> Result<Value> {
    let metrics = PlanValidator::normalize(&plan.metrics, FieldKind::Metric)?;
    let dimensions = PlanValidator::normalize(&plan.dimensions, FieldKind::Dimension)?;

    let mut body = serde_json::to_value(plan)?;
    body["metrics"] = json!(metrics.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>());
    body["dimensions"] = json!(dimensions.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>());
    body["dateRanges"] = serde_json::to_value(plan.effective_date_ranges())?;
    Ok(body)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunReportResponse {
    #[serde(default)]
    dimension_headers: Vec<Header>,
    #[serde(default)]
    metric_headers: Vec<Header>,
    #[serde(default)]
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRow {
    #[serde(default)]
    dimension_values: Vec<CellValue>,
    #[serde(default)]
    metric_values: Vec<CellValue>,
}

#[derive(Debug, Deserialize)]
struct CellValue {
    #[serde(default)]
    value: String,
}

impl RunReportResponse {
    fn into_report(self) -> ReportResponse {
        ReportResponse {
            rows: self
                .rows
                .into_iter()
                .map(|row| ReportRow {
                    dimensions: row.dimension_values.into_iter().map(|c| c.value).collect(),
                    metrics: row.metric_values.into_iter().map(|c| c.value).collect(),
                })
                .collect(),
            dimension_headers: self.dimension_headers.into_iter().map(|h| h.name).collect(),
            metric_headers: self.metric_headers.into_iter().map(|h| h.name).collect(),
        }
    }
}
