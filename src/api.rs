//! HTTP surface: request framing, routing and replies for the query server.

use crate::error::AgentError;
use crate::orchestrator::Orchestrator;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

pub const QUERY_PATH: &str = "/query";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(rename = "propertyId", default)]
    pub property_id: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpReply {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => Self::text(500, format!("Failed to encode response: {}", e)),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &ErrorResponse {
                error: message.into(),
            },
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            self.status,
            status_text(self.status),
            self.content_type,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        408 => "Request Timeout",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Unknown",
    }
}

/// Request line and the headers the server cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub content_length: usize,
}

/// Parse the head of an HTTP/1.1 request (everything before the blank line).
pub fn parse_request_head(head: &str) -> Option<RequestHead> {
    let mut lines = head.lines();
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0);

    Some(RequestHead {
        method,
        path,
        content_length,
    })
}

/// Byte offset just past the `\r\n\r\n` that ends the request head
pub fn head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

pub fn health_reply() -> HttpReply {
    HttpReply::json(
        200,
        &HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
}

pub async fn route(orchestrator: &Orchestrator, head: &RequestHead, body: &[u8]) -> HttpReply {
    match (head.method.as_str(), head.path.as_str()) {
        ("GET", HEALTH_PATH) => health_reply(),
        ("POST", QUERY_PATH) => handle_query_body(orchestrator, body).await,
        ("OPTIONS", _) => HttpReply::text(200, ""),
        (method, path) => HttpReply::error(404, format!("Not found: {} {}", method, path)),
    }
}

/// `POST /query`: decode the body, run the orchestrator and map the outcome
/// to a status code.
pub async fn handle_query_body(orchestrator: &Orchestrator, body: &[u8]) -> HttpReply {
    let request: QueryRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed query request: {}", e);
            return HttpReply::error(400, format!("Invalid request body: {}", e));
        }
    };
    if request.query.trim().is_empty() {
        return HttpReply::error(400, "query must not be empty");
    }

    match orchestrator
        .handle_query(&request.query, request.property_id.as_deref())
        .await
    {
        Ok(response) => HttpReply::text(200, response.answer),
        Err(e) => {
            let status = error_status(&e);
            if status >= 500 {
                error!("Query failed: {}", e);
            } else {
                warn!("Query rejected: {}", e);
            }
            HttpReply::error(status, e.to_string())
        }
    }
}

pub fn error_status(err: &AgentError) -> u16 {
    match err {
        AgentError::MissingParameter(_) | AgentError::Validation(_) => 400,
        AgentError::Llm(_) | AgentError::Http(_) => 502,
        _ => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_head() {
        let head = "POST /query?debug=1 HTTP/1.1\r\nHost: localhost\r\ncontent-length: 42\r\n\r\n";
        let parsed = parse_request_head(head).unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.path, "/query");
        assert_eq!(parsed.content_length, 42);
        assert!(parse_request_head("").is_none());
    }

    #[test]
    fn test_head_end() {
        let raw = b"GET /health HTTP/1.1\r\nHost: x\r\n\r\n{}";
        assert_eq!(head_end(raw), Some(raw.len() - 2));
        assert_eq!(head_end(b"GET / HTTP/1.1\r\n"), None);
    }

    #[test]
    fn test_query_request_property_id_is_optional() {
        let request: QueryRequest = serde_json::from_str(r#"{"query": "top pages"}"#).unwrap();
        assert_eq!(request.property_id, None);
        let request: QueryRequest =
            serde_json::from_str(r#"{"query": "users", "propertyId": "123"}"#).unwrap();
        assert_eq!(request.property_id.as_deref(), Some("123"));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(error_status(&AgentError::MissingParameter("propertyId".into())), 400);
        assert_eq!(error_status(&AgentError::Llm("down".into())), 502);
        assert_eq!(error_status(&AgentError::Execution("boom".into())), 500);
    }

    #[test]
    fn test_reply_bytes() {
        let reply = HttpReply::error(400, "missing");
        assert_eq!(reply.body, r#"{"error":"missing"}"#);
        let bytes = String::from_utf8(reply.to_bytes()).unwrap();
        assert!(bytes.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(bytes.ends_with("\r\n\r\n{\"error\":\"missing\"}"));

        let health = health_reply();
        assert!(health.body.contains("\"status\":\"ok\""));
    }
}
