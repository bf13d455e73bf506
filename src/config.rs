//! Process configuration, read from the environment (and `.env` via dotenv
//! in the binaries).

use crate::dataset::DEFAULT_KEY_COLUMN;
use crate::error::{AgentError, Result};
use std::path::PathBuf;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CATALOG_PATH: &str = "config/ga4_fields.txt";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LOG_FILE: &str = "server.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub catalog_path: PathBuf,
    /// Google Sheets crawl export
    pub spreadsheet_url: Option<String>,
    /// Local directory of CSV exports; preferred over `spreadsheet_url`
    pub sheets_dir: Option<PathBuf>,
    pub key_column: String,
    pub google_access_token: Option<String>,
    pub bind_addr: String,
    /// `None` logs to stdout only
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let llm_api_key = get("LITELLM_API_KEY")
            .or_else(|| get("OPENAI_API_KEY"))
            .ok_or_else(|| {
                AgentError::Configuration(
                    "LITELLM_API_KEY (or OPENAI_API_KEY) must be set".to_string(),
                )
            })?;

        let log_file = match lookup("LOG_FILE") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(PathBuf::from(value.trim())),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        Ok(Self {
            llm_api_key,
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            catalog_path: get("FIELD_CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            spreadsheet_url: get("SEO_SPREADSHEET_URL"),
            sheets_dir: get("SEO_SHEETS_DIR").map(PathBuf::from),
            key_column: get("SEO_KEY_COLUMN").unwrap_or_else(|| DEFAULT_KEY_COLUMN.to_string()),
            google_access_token: get("GOOGLE_ACCESS_TOKEN"),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_file,
        })
    }

    pub fn google_access_token(&self) -> Result<&str> {
        self.google_access_token
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("GOOGLE_ACCESS_TOKEN must be set".to_string()))
    }
}
