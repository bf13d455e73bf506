use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        /// Generated text that could not be interpreted
        raw: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Field mapping error: invalid metrics {invalid_metrics:?}, invalid dimensions {invalid_dimensions:?}")]
    FieldMapping {
        invalid_metrics: Vec<String>,
        invalid_dimensions: Vec<String>,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl AgentError {
    /// Short machine-readable name used in error envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Configuration(_) => "configuration",
            AgentError::Extraction { .. } => "extraction",
            AgentError::Validation(_) => "validation",
            AgentError::FieldMapping { .. } => "field_mapping",
            AgentError::Execution(_) => "execution",
            AgentError::MissingParameter(_) => "missing_parameter",
            AgentError::Llm(_) => "llm",
            AgentError::Http(_) => "http",
            AgentError::Io(_) => "io",
            AgentError::Json(_) => "json",
            AgentError::Polars(_) => "polars",
        }
    }
}

impl From<polars::error::PolarsError> for AgentError {
    fn from(err: polars::error::PolarsError) -> Self {
        AgentError::Polars(err.to_string())
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
