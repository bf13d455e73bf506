//! Constrained execution of generated transformations.
//!
//! A generated transformation is a single polars SQL query over the table
//! `df`, optionally preceded by a `-- kind: table|series|metric` line that
//! declares the shape of its answer. Each run gets a fresh SQL context that
//! only knows a private copy of the dataset.

use crate::error::{AgentError, Result};
use lazy_static::lazy_static;
use polars::prelude::*;
use polars::sql::SQLContext;
use regex::Regex;
use tracing::debug;

/// Table name the generated query must read from
pub const DATASET_TABLE: &str = "df";

lazy_static! {
    static ref KIND_DECLARATION: Regex =
        Regex::new(r"(?i)^--\s*(?:kind|result)\s*:\s*(table|series|metric)\s*$").unwrap();
}

/// Shape a transformation declares for its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Table,
    Series,
    Metric,
}

impl ResultKind {
    fn from_declared(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "table" => Some(ResultKind::Table),
            "series" => Some(ResultKind::Series),
            "metric" => Some(ResultKind::Metric),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
    pub kind: Option<ResultKind>,
    pub sql: String,
}

impl Transformation {
    /// Parse cleaned generator output into a single read-only statement
    pub fn parse(code: &str) -> Result<Self> {
        let mut kind = None;
        let mut body = Vec::new();

        for line in code.lines() {
            let trimmed = line.trim();
            if let Some(caps) = KIND_DECLARATION.captures(trimmed) {
                kind = ResultKind::from_declared(&caps[1]);
                continue;
            }
            if trimmed.starts_with("--") {
                continue;
            }
            body.push(line);
        }

        let sql = body.join("\n");
        let sql = sql.trim().trim_end_matches(';').trim().to_string();

        if sql.is_empty() {
            return Err(AgentError::Extraction {
                message: "Generated transformation is empty".to_string(),
                raw: code.to_string(),
            });
        }
        if has_statement_separator(&sql) {
            return Err(AgentError::Execution(
                "Generated transformation must be a single statement".to_string(),
            ));
        }
        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();
        if keyword != "SELECT" && keyword != "WITH" {
            return Err(AgentError::Execution(format!(
                "Generated transformation must be a SELECT query, got '{}'",
                keyword
            )));
        }

        Ok(Self { kind, sql })
    }

    /// Run against a private copy of `dataset`
    pub fn execute(&self, dataset: &DataFrame) -> Result<DataFrame> {
        debug!("Executing transformation: {}", self.sql);

        let mut ctx = SQLContext::new();
        ctx.register(DATASET_TABLE, dataset.clone().lazy());

        ctx.execute(&self.sql)
            .and_then(|lf| lf.collect())
            .map_err(|e| AgentError::Execution(format!("Failed to execute generated query: {}", e)))
    }
}

/// `;` outside single-quoted literals and double-quoted identifiers.
/// Doubled quotes inside either are escapes and keep the quoting open.
fn has_statement_separator(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match (quote, c) {
            (None, '\'') | (None, '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ';') => return true,
            _ => {}
        }
    }
    false
}
