//! In-memory doubles for the generator, reporting and spreadsheet clients

#![allow(dead_code)]

use async_trait::async_trait;
use insight_router::error::{AgentError, Result};
use insight_router::llm::TextGenerator;
use insight_router::plan::QueryPlan;
use insight_router::services::{ReportResponse, ReportRow, ReportingClient, Sheet, SpreadsheetClient};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays canned completions in order and records every user prompt
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Llm("no scripted reply left".to_string()))
    }
}

/// Returns a fixed report and remembers each plan it was asked to run
pub struct RecordingReporting {
    response: ReportResponse,
    calls: AtomicUsize,
    plans: Mutex<Vec<(QueryPlan, String)>>,
}

impl RecordingReporting {
    pub fn new(response: ReportResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
            plans: Mutex::new(Vec::new()),
        })
    }

    pub fn with_rows(rows: &[(&str, &str)]) -> Arc<Self> {
        Self::new(ReportResponse {
            rows: rows
                .iter()
                .map(|(dim, metric)| ReportRow {
                    dimensions: vec![dim.to_string()],
                    metrics: vec![metric.to_string()],
                })
                .collect(),
            dimension_headers: vec!["date".to_string()],
            metric_headers: vec!["activeUsers".to_string()],
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn plans(&self) -> Vec<(QueryPlan, String)> {
        self.plans.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportingClient for RecordingReporting {
    async fn run_report(&self, plan: &QueryPlan, property_id: &str) -> Result<ReportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.plans
            .lock()
            .unwrap()
            .push((plan.clone(), property_id.to_string()));
        Ok(self.response.clone())
    }
}

/// Serves fixed sheets, or fails when built with `failing`
pub struct StaticSheets {
    sheets: Option<Vec<Sheet>>,
}

impl StaticSheets {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self {
            sheets: Some(sheets),
        }
    }

    pub fn failing() -> Self {
        Self { sheets: None }
    }
}

#[async_trait]
impl SpreadsheetClient for StaticSheets {
    async fn fetch_sheets(&self, _url: &str) -> Result<Vec<Sheet>> {
        self.sheets
            .clone()
            .ok_or_else(|| AgentError::Http("spreadsheet unavailable".to_string()))
    }
}

pub fn sheet(name: &str, rows: Vec<Value>) -> Sheet {
    Sheet {
        sheet_name: name.to_string(),
        rows: rows
            .into_iter()
            .filter_map(|row| row.as_object().cloned())
            .collect(),
    }
}

/// Two-tab crawl export keyed by `Address`
pub fn crawl_sheets() -> Vec<Sheet> {
    use serde_json::json;
    vec![
        sheet(
            "Internal",
            vec![
                json!({"Address": "https://site.example/", "Title": "Home", "Status Code": 200}),
                json!({"Address": "https://site.example/old", "Title": "Old", "Status Code": 404}),
                json!({"Address": "https://site.example/blog", "Title": "Blog", "Status Code": 200}),
            ],
        ),
        sheet(
            "Response Codes",
            vec![
                json!({"Address": "https://site.example/old", "Indexability": "Non-Indexable"}),
                json!({"Address": "https://site.example/", "Indexability": "Indexable"}),
            ],
        ),
    ]
}

/// Requests seen by a local stub server, as raw text
pub type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Serve canned JSON bodies over plain HTTP on a loopback port. `respond`
/// maps a request path to a body; `None` answers 404. Returns the base URL
/// and the requests received.
pub async fn serve_json<F>(respond: F) -> (String, SeenRequests)
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    use insight_router::api::{head_end, parse_request_head, HttpReply};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let requests = seen.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let respond = respond.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 4096];
                let head_len = loop {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    buffer.extend_from_slice(&chunk[..n]);
                    if let Some(end) = head_end(&buffer) {
                        break end;
                    }
                };
                let head = match parse_request_head(&String::from_utf8_lossy(&buffer[..head_len])) {
                    Some(head) => head,
                    None => return,
                };
                while buffer.len() < head_len + head.content_length {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buffer.extend_from_slice(&chunk[..n]);
                }
                requests
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buffer).to_string());

                let reply = match respond(&head.path) {
                    Some(body) => HttpReply {
                        status: 200,
                        content_type: "application/json",
                        body,
                    },
                    None => HttpReply::error(404, format!("no route for {}", head.path)),
                };
                let _ = stream.write_all(&reply.to_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (base_url, seen)
}
