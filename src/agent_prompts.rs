//! Agent Prompts - system and user prompts for intent routing, plan
//! generation, tabular transformations and answer fusion.

use crate::catalog::{FieldCatalog, FieldKind};
use crate::execution::result::Record;
use crate::execution::sandbox::DATASET_TABLE;
use itertools::Itertools;

/// System prompt for intent classification
pub const INTENT_SYSTEM_PROMPT: &str = r#"You route analytics questions.

Answer with exactly one word:
- seo        -> the question is about pages, URLs, crawl data, titles, status codes, indexability or other on-site SEO attributes
- analytics  -> the question is about traffic, users, sessions, page views, conversions or other web analytics measurements
- both       -> the question needs both kinds of data

Respond with only the word, no punctuation, no explanation."#;

/// System prompt for reporting plan generation
pub const PLAN_SYSTEM_PROMPT: &str = r#"You are a Google Analytics 4 query planner.

Task:
Convert a natural language question into a GA4 Data API query plan.

Rules (STRICT):
- Respond with ONLY valid JSON
- Do NOT include explanations
- Do NOT include markdown or code fences
- Use ONLY metric and dimension names from the allowed lists you are given
- If a concept in the question has no allowed field, omit it instead of inventing a name

Required fields:
- metrics: list of GA4 metric names
- dimensions: list of GA4 dimension names
- dateRanges: list of {"startDate": ..., "endDate": ...} using YYYY-MM-DD, today, yesterday or NdaysAgo

Optional fields (include ONLY if relevant):
- dimensionFilter
- metricFilter
- orderBys
- limit
- offset
- keepEmptyRows
- currencyCode
- cohortSpec
- metricAggregations

Guidelines:
- Prefer minimal queries
- Infer reasonable date ranges when not specified"#;

/// System prompt for tabular transformation generation
pub const TABULAR_SYSTEM_PROMPT: &str = "You are a SQL generator for SEO crawl analysis.";

/// System prompt for answer fusion
pub const FUSION_SYSTEM_PROMPT: &str = r#"You are a helpful analytics assistant.

Write one concrete, factual, conversational answer to the user's question using only the data provided.
- Quote the actual numbers, pages or values that answer the question.
- If the data is empty or contains an error, say plainly that no data was found for the question.
- Never mention agents, tools, internal systems, spreadsheets, APIs or data sources.
- Do not invent values that are not in the data."#;

pub fn intent_prompt(question: &str) -> String {
    format!("Question: {}", question)
}

pub fn plan_prompt(question: &str, catalog: &FieldCatalog) -> String {
    format!(
        "Allowed metrics:\n{}\n\nAllowed dimensions:\n{}\n\nQuestion: {}",
        catalog.sorted_names(FieldKind::Metric).join(", "),
        catalog.sorted_names(FieldKind::Dimension).join(", "),
        question
    )
}

pub fn tabular_prompt(columns: &[String], sample: &[Record], question: &str) -> String {
    let columns_list = columns.iter().map(|c| format!("\"{}\"", c)).join(", ");
    let sample_block = if sample.is_empty() {
        String::new()
    } else {
        let rows = sample
            .iter()
            .map(|row| serde_json::Value::Object(row.clone()).to_string())
            .join("\n");
        format!("Sample data:\n{}\n", rows)
    };

    format!(
        r#"You are an SEO data analyst.

You are given a table named `{table}` with the following columns:
{columns}

{sample}
Rules (STRICT):
- Write exactly one SQL SELECT statement that reads only from `{table}`.
- Use ONLY the columns listed above and always wrap column names in double quotes.
- Do NOT invent or rename columns.
- The first line must declare the shape of the answer: `-- kind: table`, `-- kind: series` or `-- kind: metric`.
  - table: several columns of rows
  - series: one label column and one value column, or a single column
  - metric: exactly one numeric value
- No explanations, no markdown.

Task:
Convert the following user question into a SQL query over `{table}`.
Question:
{question}
"#,
        table = DATASET_TABLE,
        columns = columns_list,
        sample = sample_block,
        question = question
    )
}

pub fn fusion_prompt(
    question: &str,
    seo_result: Option<&serde_json::Value>,
    analytics_result: Option<&serde_json::Value>,
) -> String {
    let render = |value: Option<&serde_json::Value>| {
        value
            .map(|v| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()))
            .unwrap_or_else(|| "null".to_string())
    };
    format!(
        "User question:\n{}\n\nSite data:\n{}\n\nTraffic data:\n{}\n\nAnswer:",
        question,
        render(seo_result),
        render(analytics_result)
    )
}
