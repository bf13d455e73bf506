mod common;

use common::{RecordingReporting, ScriptedGenerator};
use insight_router::agents::structured::{NO_DATA_EXPLANATION, RESULTS_EXPLANATION};
use insight_router::agents::{AgentResult, StructuredQueryAgent};
use insight_router::catalog::FieldCatalog;
use insight_router::error::AgentError;
use serde_json::json;
use std::sync::Arc;

fn catalog() -> Arc<FieldCatalog> {
    Arc::new(FieldCatalog::parse(
        "# Metrics\nactiveUsers\nsessions\nbounceRate\n\n# Dimensions\ndate\npagePath\n",
    ))
}

#[tokio::test]
async fn test_plan_defaults_dimension_and_empty_rows() {
    let plan_text = r#"{"metrics":[{"name":"activeUsers"}],"dimensions":[],"dateRanges":[{"startDate":"yesterday","endDate":"yesterday"}]}"#;
    let llm = ScriptedGenerator::new(&[plan_text]);
    let reporting = RecordingReporting::with_rows(&[]);
    let agent = StructuredQueryAgent::new(llm.clone(), catalog(), reporting.clone());

    let plan = agent.plan_query("How many users yesterday?").await.unwrap();
    assert_eq!(plan.dimensions, vec![json!({"name": "date"})]);
    assert_eq!(plan.keep_empty_rows, Some(true));
    assert_eq!(plan.date_ranges[0].start_date, "yesterday");
    assert_eq!(reporting.calls(), 0);

    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("activeUsers, bounceRate, sessions"));
    assert!(prompt.contains("How many users yesterday?"));
}

#[tokio::test]
async fn test_report_from_fenced_plan() {
    let plan_text = "```json\n{\"metrics\": [\"sessions\"], \"dimensions\": [\"pagePath\"], \"dateRanges\": [{\"startDate\": \"7daysAgo\", \"endDate\": \"today\"}]}\n```";
    let llm = ScriptedGenerator::new(&[plan_text]);
    let reporting = RecordingReporting::with_rows(&[("/", "120"), ("/blog", "30")]);
    let agent = StructuredQueryAgent::new(llm, catalog(), reporting.clone());

    let result = agent.handle_query("Sessions by page this week", "properties/123").await;
    match result {
        AgentResult::Report(outcome) => {
            assert_eq!(outcome.row_count, 2);
            assert_eq!(outcome.rows[0].metrics, vec!["120".to_string()]);
            assert_eq!(outcome.explanation, RESULTS_EXPLANATION);
            assert_eq!(outcome.plan.keep_empty_rows, Some(true));
        }
        other => panic!("expected report, got {:?}", other),
    }

    let plans = reporting.plans();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].1, "properties/123");
    assert_eq!(plans[0].0.dimensions, vec![json!("pagePath")]);
}

#[tokio::test]
async fn test_empty_report_explains_no_data() {
    let llm = ScriptedGenerator::new(&[r#"{"metrics":["activeUsers"]}"#]);
    let reporting = RecordingReporting::with_rows(&[]);
    let agent = StructuredQueryAgent::new(llm, catalog(), reporting);

    match agent.handle_query("Users today", "123").await {
        AgentResult::Report(outcome) => {
            assert_eq!(outcome.row_count, 0);
            assert_eq!(outcome.explanation, NO_DATA_EXPLANATION);
        }
        other => panic!("expected report, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_metric_never_reaches_reporting() {
    let plan_text = r#"{"metrics":[{"name":"bounceRateXYZ"}],"dimensions":[{"name":"date"}],"dateRanges":[{"startDate":"7daysAgo","endDate":"today"}]}"#;
    let llm = ScriptedGenerator::new(&[plan_text]);
    let reporting = RecordingReporting::with_rows(&[("20240101", "1")]);
    let agent = StructuredQueryAgent::new(llm, catalog(), reporting.clone());

    let result = agent.handle_query("What is the bounce rate?", "123").await;
    let failure = result.failure().expect("error result");
    assert_eq!(failure.invalid_metrics, vec!["bounceRateXYZ".to_string()]);
    assert!(failure.invalid_dimensions.is_empty());
    assert_eq!(failure.kind.as_deref(), Some("field_mapping"));
    assert!(failure.hint.as_deref().unwrap().contains("bounceRateXYZ -> bounceRate"));
    assert_eq!(reporting.calls(), 0);
}

#[tokio::test]
async fn test_unparseable_plan_carries_raw_output() {
    let llm = ScriptedGenerator::new(&["Sorry, I can't build that query."]);
    let reporting = RecordingReporting::with_rows(&[]);
    let agent = StructuredQueryAgent::new(llm, catalog(), reporting.clone());

    let failure = match agent.handle_query("???", "123").await {
        AgentResult::Error(failure) => failure,
        other => panic!("expected error, got {:?}", other),
    };
    assert_eq!(failure.kind.as_deref(), Some("extraction"));
    assert_eq!(
        failure.raw_output.as_deref(),
        Some("Sorry, I can't build that query.")
    );
    assert_eq!(reporting.calls(), 0);
}

#[tokio::test]
async fn test_bad_date_token_is_validation_error() {
    let plan_text = r#"{"metrics":["sessions"],"dateRanges":[{"startDate":"last month","endDate":"today"}]}"#;
    let llm = ScriptedGenerator::new(&[plan_text]);
    let agent = StructuredQueryAgent::new(llm, catalog(), RecordingReporting::with_rows(&[]));

    let err = agent.plan_query("sessions last month").await.unwrap_err();
    assert!(matches!(err, AgentError::Validation(_)));
}
