pub mod agent_prompts;
pub mod agents;
pub mod api;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod execution;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod plan;
pub mod services;

pub use agents::{AgentFailure, AgentResult, StructuredQueryAgent, TabularAgent};
pub use catalog::{FieldCatalog, FieldKind};
pub use config::AppConfig;
pub use dataset::UnionDataset;
pub use error::{AgentError, Result};
pub use orchestrator::{Intent, Orchestrator, OrchestratorResponse};
