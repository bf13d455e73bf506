//! Spreadsheet clients
//!
//! A spreadsheet is read as a list of sheets, each a list of row records keyed
//! by the header row. Two sources: Google Sheets (v4 values API) and a local
//! directory of CSV files, one sheet per file.

use crate::error::{AgentError, Result};
use crate::execution::result::{frame_to_records, Record};
use async_trait::async_trait;
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

lazy_static! {
    static ref SPREADSHEET_ID: Regex = Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").unwrap();
    static ref BARE_ID: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub sheet_name: String,
    pub rows: Vec<Record>,
}

#[async_trait]
pub trait SpreadsheetClient: Send + Sync {
    async fn fetch_sheets(&self, url: &str) -> Result<Vec<Sheet>>;
}

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            base_url: SHEETS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: reqwest::Url) -> Result<T> {
        let response = self.http.get(url).bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Http(format!(
                "Sheets request failed ({}): {}",
                status, detail
            )));
        }
        Ok(response.json().await?)
    }

    fn endpoint(&self, spreadsheet_id: &str, extra_segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AgentError::Configuration(format!("Invalid Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AgentError::Configuration("Sheets base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(spreadsheet_id)
            .extend(extra_segments);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[async_trait]
impl SpreadsheetClient for GoogleSheetsClient {
    async fn fetch_sheets(&self, url: &str) -> Result<Vec<Sheet>> {
        let spreadsheet_id = spreadsheet_id(url)?;

        let mut meta_url = self.endpoint(&spreadsheet_id, &[])?;
        meta_url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.get_json(meta_url).await?;

        let mut sheets = Vec::with_capacity(meta.sheets.len());
        for sheet in meta.sheets {
            let title = sheet.properties.title;
            let range = format!("'{}'", title.replace('\'', "''"));
            let mut values_url = self.endpoint(&spreadsheet_id, &["values", &range])?;
            values_url
                .query_pairs_mut()
                .append_pair("valueRenderOption", "UNFORMATTED_VALUE");
            let values: ValueRange = self.get_json(values_url).await?;
            debug!("Fetched sheet '{}' ({} raw rows)", title, values.values.len());
            sheets.push(Sheet {
                sheet_name: title,
                rows: records_from_values(values.values),
            });
        }

        info!("Fetched {} sheets from spreadsheet {}", sheets.len(), spreadsheet_id);
        Ok(sheets)
    }
}

/// Spreadsheet id from a sheet URL, or the input itself if it already is one
pub fn spreadsheet_id(url: &str) -> Result<String> {
    if let Some(caps) = SPREADSHEET_ID.captures(url) {
        return Ok(caps[1].to_string());
    }
    if BARE_ID.is_match(url) {
        return Ok(url.to_string());
    }
    Err(AgentError::Configuration(format!("Not a Google Sheets URL: {}", url)))
}

/// Header-keyed records from a values grid. Short rows are padded with empty
/// strings; rows with no content are skipped.
pub fn records_from_values(values: Vec<Vec<Value>>) -> Vec<Record> {
    let mut grid = values.into_iter();
    let headers: Vec<String> = match grid.next() {
        Some(header_row) => header_row.iter().map(cell_to_header).collect(),
        None => return Vec::new(),
    };

    grid.filter(|row| row.iter().any(|cell| !is_blank(cell)))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = row.get(i).cloned().unwrap_or_else(|| Value::String(String::new()));
                    (header.clone(), cell)
                })
                .collect()
        })
        .collect()
}

fn cell_to_header(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Reads every `*.csv` file of a directory as one sheet
pub struct CsvDirectoryClient;

impl CsvDirectoryClient {
    fn read_sheet(path: &Path) -> Result<Sheet> {
        let frame = LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()?
            .collect()?;
        let sheet_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Sheet {
            sheet_name,
            rows: frame_to_records(&frame)?,
        })
    }
}

#[async_trait]
impl SpreadsheetClient for CsvDirectoryClient {
    async fn fetch_sheets(&self, url: &str) -> Result<Vec<Sheet>> {
        let dir = PathBuf::from(url);
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let sheets = paths
            .iter()
            .map(|path| Self::read_sheet(path))
            .collect::<Result<Vec<_>>>()?;
        info!("Read {} CSV sheets from {}", sheets.len(), dir.display());
        Ok(sheets)
    }
}
