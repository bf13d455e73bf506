//! Structured-Query Agent
//!
//! Question -> generated plan -> extracted, validated and repaired plan ->
//! reporting client -> shaped report. Every failure is returned as an error
//! result; nothing propagates past `handle_query`.

use crate::agent_prompts::{plan_prompt, PLAN_SYSTEM_PROMPT};
use crate::agents::result::{AgentFailure, AgentResult, ReportOutcome};
use crate::catalog::FieldCatalog;
use crate::error::{AgentError, Result};
use crate::llm::TextGenerator;
use crate::plan::{apply_defaults, extract_json_object, PlanValidation, PlanValidator, QueryPlan};
use crate::services::reporting::ReportingClient;
use std::sync::Arc;
use tracing::{info, warn};

pub const NO_DATA_EXPLANATION: &str = "No data was returned for this query.";
pub const RESULTS_EXPLANATION: &str = "Results found for the requested query.";

const REMEDIATION_HINT: &str =
    "Rephrase the question using metrics and dimensions supported by Google Analytics 4.";

pub struct StructuredQueryAgent {
    llm: Arc<dyn TextGenerator>,
    validator: PlanValidator,
    reporting: Arc<dyn ReportingClient>,
}

impl StructuredQueryAgent {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        catalog: Arc<FieldCatalog>,
        reporting: Arc<dyn ReportingClient>,
    ) -> Self {
        Self {
            llm,
            validator: PlanValidator::new(catalog),
            reporting,
        }
    }

    /// Generate, extract, validate and repair a plan without executing it
    pub async fn plan_query(&self, query: &str) -> Result<QueryPlan> {
        let prompt = plan_prompt(query, self.validator.catalog());
        let plan_text = self.llm.generate(PLAN_SYSTEM_PROMPT, &prompt).await?;
        info!("Raw plan response: {:?}", plan_text);

        let value = extract_json_object(&plan_text)?;
        let mut plan = QueryPlan::from_value(value)?;

        let validation = self.validator.validate(&plan)?;
        if !validation.is_valid() {
            return Err(AgentError::FieldMapping {
                invalid_metrics: validation.invalid_metrics,
                invalid_dimensions: validation.invalid_dimensions,
            });
        }
        PlanValidator::validate_date_ranges(&plan)?;

        apply_defaults(&mut plan);
        info!("Validated plan: {}", serde_json::to_string(&plan)?);
        Ok(plan)
    }

    pub async fn handle_query(&self, query: &str, property_id: &str) -> AgentResult {
        match self.run(query, property_id).await {
            Ok(outcome) => AgentResult::Report(outcome),
            Err(e) => {
                warn!("Structured query failed: {}", e);
                self.failure(e)
            }
        }
    }

    async fn run(&self, query: &str, property_id: &str) -> Result<ReportOutcome> {
        let plan = self.plan_query(query).await?;
        let report = self.reporting.run_report(&plan, property_id).await?;

        let row_count = report.rows.len();
        let explanation = if row_count == 0 {
            NO_DATA_EXPLANATION
        } else {
            RESULTS_EXPLANATION
        };

        Ok(ReportOutcome {
            plan,
            row_count,
            rows: report.rows,
            dimension_headers: report.dimension_headers,
            metric_headers: report.metric_headers,
            explanation: explanation.to_string(),
        })
    }

    fn failure(&self, err: AgentError) -> AgentResult {
        let failure = AgentFailure::from(&err);
        let failure = match err {
            AgentError::FieldMapping {
                invalid_metrics,
                invalid_dimensions,
            } => {
                let suggestions = self.validator.suggestions(&PlanValidation {
                    invalid_metrics,
                    invalid_dimensions,
                });
                let hint = if suggestions.is_empty() {
                    REMEDIATION_HINT.to_string()
                } else {
                    format!("{} Closest supported names: {}.", REMEDIATION_HINT, suggestions.join(", "))
                };
                AgentFailure {
                    error: "The question refers to fields that are not available.".to_string(),
                    ..failure
                }
                .with_hint(hint)
            }
            _ => failure,
        };
        AgentResult::Error(failure)
    }
}
