//! Orchestrator - routes a question to the tabular agent, the structured
//! query agent or both, then fuses their results into one answer.

use crate::agent_prompts::{fusion_prompt, intent_prompt, FUSION_SYSTEM_PROMPT, INTENT_SYSTEM_PROMPT};
use crate::agents::{AgentResult, StructuredQueryAgent, TabularAgent};
use crate::catalog::FieldCatalog;
use crate::config::AppConfig;
use crate::dataset::UnionDataset;
use crate::error::{AgentError, Result};
use crate::llm::{LlmClient, TextGenerator};
use crate::services::{CsvDirectoryClient, Ga4Client, GoogleSheetsClient, ReportingClient};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Seo,
    Analytics,
    Both,
}

impl Intent {
    /// Parse a classifier answer, tolerating case, quotes, backticks and a
    /// trailing period in any nesting.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut token = raw.trim();
        loop {
            let stripped = token
                .trim_end_matches('.')
                .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                .trim();
            if stripped == token {
                break;
            }
            token = stripped;
        }
        match token.to_lowercase().as_str() {
            "seo" => Some(Intent::Seo),
            "analytics" => Some(Intent::Analytics),
            "both" => Some(Intent::Both),
            _ => None,
        }
    }

    pub fn needs_tabular(&self) -> bool {
        matches!(self, Intent::Seo | Intent::Both)
    }

    pub fn needs_structured(&self) -> bool {
        matches!(self, Intent::Analytics | Intent::Both)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::Seo => "seo",
            Intent::Analytics => "analytics",
            Intent::Both => "both",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classifying,
    Executing,
    Fusing,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorResponse {
    pub request_id: String,
    pub intent: Intent,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_result: Option<AgentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_result: Option<AgentResult>,
}

pub struct Orchestrator {
    llm: Arc<dyn TextGenerator>,
    tabular: TabularAgent,
    structured: StructuredQueryAgent,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        tabular: TabularAgent,
        structured: StructuredQueryAgent,
    ) -> Self {
        Self {
            llm,
            tabular,
            structured,
        }
    }

    /// Wire every component from configuration: load the field catalog,
    /// build the generator and reporting clients, and build the union
    /// dataset from the configured spreadsheet source.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = Arc::new(FieldCatalog::load(&config.catalog_path)?);
        let client = LlmClient::new(
            config.llm_api_key.clone(),
            config.llm_model.clone(),
            config.llm_base_url.clone(),
        );
        info!("Using model {} at {}", client.model(), config.llm_base_url);
        let llm: Arc<dyn TextGenerator> = Arc::new(client);
        let reporting: Arc<dyn ReportingClient> =
            Arc::new(Ga4Client::new(config.google_access_token()?.to_string()));

        let tabular = if let Some(dir) = &config.sheets_dir {
            let source = dir.to_string_lossy();
            TabularAgent::build(llm.clone(), &CsvDirectoryClient, &source, &config.key_column).await
        } else if let Some(url) = &config.spreadsheet_url {
            let client = GoogleSheetsClient::new(config.google_access_token()?.to_string());
            TabularAgent::build(llm.clone(), &client, url, &config.key_column).await
        } else {
            warn!("No spreadsheet source configured; site questions will find no data");
            TabularAgent::new(llm.clone(), UnionDataset::empty(&config.key_column))
        };
        let dataset = tabular.dataset();
        info!(
            "Union table ready: {} rows keyed by '{}', {} columns",
            dataset.frame().height(),
            dataset.key_column(),
            dataset.columns().len()
        );

        let structured = StructuredQueryAgent::new(llm.clone(), catalog, reporting);
        Ok(Self::new(llm, tabular, structured))
    }

    /// Ask the generator which data source the question needs.
    pub async fn classify(&self, question: &str, property_id: Option<&str>) -> Result<Intent> {
        let answer = self
            .llm
            .generate(INTENT_SYSTEM_PROMPT, &intent_prompt(question))
            .await?;

        match Intent::parse(&answer) {
            Some(intent) => Ok(intent),
            None => {
                let fallback = if property_id.is_some() {
                    Intent::Both
                } else {
                    Intent::Seo
                };
                warn!(
                    "Unrecognized intent {:?}; falling back to {}",
                    answer.trim(),
                    fallback
                );
                Ok(fallback)
            }
        }
    }

    pub async fn handle_query(
        &self,
        question: &str,
        property_id: Option<&str>,
    ) -> Result<OrchestratorResponse> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("request", request_id = %request_id);
        self.process(request_id.clone(), question, property_id)
            .instrument(span)
            .await
    }

    async fn process(
        &self,
        request_id: String,
        question: &str,
        property_id: Option<&str>,
    ) -> Result<OrchestratorResponse> {
        let property_id = property_id.map(str::trim).filter(|p| !p.is_empty());
        info!("Question: {}", question);

        info!(stage = ?Stage::Classifying, "Classifying question");
        let intent = self.classify(question, property_id).await?;
        info!("Intent: {}", intent);

        info!(stage = ?Stage::Executing, "Executing {} branch", intent);
        let analytics_property = if intent.needs_structured() {
            match property_id {
                Some(id) => Some(id),
                None => {
                    return Err(AgentError::MissingParameter(
                        "propertyId is required for analytics questions".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let seo_result = if intent.needs_tabular() {
            Some(self.tabular.query(question, true).await)
        } else {
            None
        };
        let analytics_result = match analytics_property {
            Some(id) => Some(self.structured.handle_query(question, id).await),
            None => None,
        };

        info!(stage = ?Stage::Fusing, "Fusing results");
        let seo_json = seo_result.as_ref().map(serde_json::to_value).transpose()?;
        let analytics_json = analytics_result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let prompt = fusion_prompt(question, seo_json.as_ref(), analytics_json.as_ref());
        let answer = self.llm.generate(FUSION_SYSTEM_PROMPT, &prompt).await?;

        Ok(OrchestratorResponse {
            request_id,
            intent,
            answer: answer.trim().to_string(),
            seo_result,
            analytics_result,
        })
    }
}
