//! Tabular Agent
//!
//! Answers questions over the crawl-export union dataset by having the
//! generator write one SQL query against `df`, running it in a fresh SQL
//! context, and classifying the shape of the answer.

use crate::agent_prompts::{tabular_prompt, TABULAR_SYSTEM_PROMPT};
use crate::agents::result::AgentResult;
use crate::dataset::{UnionDataset, SAMPLE_ROWS};
use crate::error::Result;
use crate::execution::{classify, Transformation};
use crate::llm::TextGenerator;
use crate::plan::strip_code_fences;
use crate::services::sheets::SpreadsheetClient;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const NO_DATA_MESSAGE: &str = "No data available from spreadsheet.";

pub struct TabularAgent {
    llm: Arc<dyn TextGenerator>,
    dataset: Arc<UnionDataset>,
}

impl TabularAgent {
    pub fn new(llm: Arc<dyn TextGenerator>, dataset: UnionDataset) -> Self {
        Self {
            llm,
            dataset: Arc::new(dataset),
        }
    }

    /// Build the union dataset from a spreadsheet. A source that cannot be
    /// read leaves the agent with an empty dataset.
    pub async fn build(
        llm: Arc<dyn TextGenerator>,
        client: &dyn SpreadsheetClient,
        url: &str,
        key_column: &str,
    ) -> Self {
        info!("Building union table from spreadsheet {}", url);
        let dataset = match client.fetch_sheets(url).await {
            Ok(sheets) => UnionDataset::from_sheets(sheets, key_column).unwrap_or_else(|e| {
                error!("Failed to build union table: {}", e);
                UnionDataset::empty(key_column)
            }),
            Err(e) => {
                error!("Failed to read spreadsheet {}: {}", url, e);
                UnionDataset::empty(key_column)
            }
        };
        Self::new(llm, dataset)
    }

    pub fn dataset(&self) -> &UnionDataset {
        &self.dataset
    }

    /// Answer `question` over the dataset. Never fails: every problem comes
    /// back as an error result.
    pub async fn query(&self, question: &str, structured: bool) -> AgentResult {
        if self.dataset.is_empty() {
            return AgentResult::error(NO_DATA_MESSAGE);
        }

        match self.run(question, structured).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tabular query failed: {}", e);
                AgentResult::from(e)
            }
        }
    }

    async fn run(&self, question: &str, structured: bool) -> Result<AgentResult> {
        let columns = self.dataset.columns();
        let sample = self.dataset.sample_records(SAMPLE_ROWS)?;
        let prompt = tabular_prompt(&columns, &sample, question);

        let generated = self.llm.generate(TABULAR_SYSTEM_PROMPT, &prompt).await?;
        let code = strip_code_fences(&generated);
        info!("Generated transformation:\n{}", code);

        let transformation = Transformation::parse(&code)?;
        let frame = transformation.execute(self.dataset.frame())?;
        classify(frame, transformation.kind, structured)
    }
}
