//! Query-generating agents

pub mod result;
pub mod structured;
pub mod tabular;

pub use result::{AgentFailure, AgentResult, ReportOutcome};
pub use structured::StructuredQueryAgent;
pub use tabular::TabularAgent;
