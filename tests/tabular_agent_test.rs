mod common;

use common::{crawl_sheets, ScriptedGenerator, StaticSheets};
use insight_router::agents::tabular::NO_DATA_MESSAGE;
use insight_router::agents::{AgentResult, TabularAgent};
use insight_router::dataset::{UnionDataset, DEFAULT_KEY_COLUMN};
use serde_json::json;

const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/abc123/edit";

async fn crawl_agent(replies: &[&str]) -> (TabularAgent, std::sync::Arc<ScriptedGenerator>) {
    let llm = ScriptedGenerator::new(replies);
    let client = StaticSheets::new(crawl_sheets());
    let agent = TabularAgent::build(llm.clone(), &client, SHEET_URL, DEFAULT_KEY_COLUMN).await;
    (agent, llm)
}

#[tokio::test]
async fn test_build_unions_tabs_on_address() {
    let (agent, _) = crawl_agent(&[]).await;
    let dataset = agent.dataset();
    assert_eq!(dataset.frame().height(), 3);
    assert_eq!(
        dataset.columns(),
        vec!["Address", "Title", "Status Code", "Indexability"]
    );
}

#[tokio::test]
async fn test_empty_dataset_answers_without_generating() {
    let llm = ScriptedGenerator::new(&["-- kind: table\nSELECT * FROM df"]);
    let agent = TabularAgent::new(llm.clone(), UnionDataset::empty(DEFAULT_KEY_COLUMN));

    let result = agent.query("Which pages are broken?", true).await;
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"error": NO_DATA_MESSAGE})
    );
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_unreadable_spreadsheet_leaves_empty_dataset() {
    let llm = ScriptedGenerator::new(&[]);
    let agent = TabularAgent::build(llm, &StaticSheets::failing(), SHEET_URL, DEFAULT_KEY_COLUMN).await;
    assert!(agent.dataset().is_empty());
    assert!(agent.query("anything", true).await.is_error());
}

#[tokio::test]
async fn test_metric_answer() {
    let code = "```sql\n-- kind: metric\nSELECT COUNT(*) AS broken FROM df WHERE \"Status Code\" = 404\n```";
    let (agent, llm) = crawl_agent(&[code]).await;

    let result = agent.query("How many pages return 404?", true).await;
    assert_eq!(result, AgentResult::Metric { result: 1.0 });

    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("\"Status Code\""));
    assert!(prompt.contains("How many pages return 404?"));
}

#[tokio::test]
async fn test_table_answer_with_records() {
    let code = "-- kind: table\nSELECT \"Address\", \"Title\" FROM df WHERE \"Status Code\" = 200 ORDER BY \"Address\"";
    let (agent, _) = crawl_agent(&[code]).await;

    match agent.query("List the pages returning 200", true).await {
        AgentResult::Table { results, count } => {
            assert_eq!(count.as_u64(), Some(2));
            assert_eq!(results[0]["Address"], json!("https://site.example/"));
            assert_eq!(results[1]["Title"], json!("Blog"));
        }
        other => panic!("expected table, got {:?}", other),
    }
}

#[tokio::test]
async fn test_series_count_sums_values() {
    let code = "-- kind: series\nSELECT \"Status Code\", COUNT(*) AS pages FROM df GROUP BY \"Status Code\" ORDER BY \"Status Code\"";
    let (agent, _) = crawl_agent(&[code]).await;

    match agent.query("Pages per status code", true).await {
        AgentResult::Table { results, count } => {
            assert_eq!(results.len(), 2);
            assert_eq!(count.as_u64(), Some(3));
        }
        other => panic!("expected series table, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failing_statement_is_error_result() {
    let code = "-- kind: table\nSELECT \"Word Count\" FROM df";
    let (agent, _) = crawl_agent(&[code]).await;

    let result = agent.query("Average word count?", true).await;
    let failure = result.failure().expect("error result");
    assert_eq!(failure.kind.as_deref(), Some("execution"));
    assert!(!failure.error.is_empty());
}

#[tokio::test]
async fn test_mutating_statement_is_rejected() {
    let (agent, _) = crawl_agent(&["DROP TABLE df"]).await;
    let result = agent.query("delete everything", true).await;
    assert_eq!(result.failure().unwrap().kind.as_deref(), Some("execution"));
    assert_eq!(agent.dataset().frame().height(), 3);
}
