//! Insight Router HTTP Server
//!
//! `POST /query` answers a question, `GET /health` reports liveness.
//! Uses tokio directly (no web framework).

use anyhow::Result;
use insight_router::api::{self, HttpReply, RequestHead};
use insight_router::config::AppConfig;
use insight_router::logging;
use insight_router::orchestrator::Orchestrator;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

const HEAD_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_BODY_BYTES: usize = 1 << 20;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;
    logging::init(config.log_file.as_deref())?;

    info!("Starting insight router (model {})", config.llm_model);
    let orchestrator = Arc::new(Orchestrator::from_config(&config).await?);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on {}", config.bind_addr);

    loop {
        let (stream, addr) = listener.accept().await?;
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, orchestrator).await {
                error!("Error handling connection from {}: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, orchestrator: Arc<Orchestrator>) -> Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    let head_result = timeout(HEAD_TIMEOUT, async {
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok::<_, std::io::Error>(None);
            }
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(end) = api::head_end(&buffer) {
                return Ok(Some(end));
            }
        }
    })
    .await;

    let head_len = match head_result {
        Ok(Ok(Some(end))) => end,
        Ok(Ok(None)) => return Ok(()),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return send(&mut stream, HttpReply::error(408, "Request timeout")).await;
        }
    };

    let head_text = String::from_utf8_lossy(&buffer[..head_len]).to_string();
    let head: RequestHead = match api::parse_request_head(&head_text) {
        Some(head) => head,
        None => return send(&mut stream, HttpReply::error(400, "Invalid request line")).await,
    };
    if head.content_length > MAX_BODY_BYTES {
        return send(&mut stream, HttpReply::error(400, "Request body too large")).await;
    }

    let mut body = buffer[head_len..].to_vec();
    while body.len() < head.content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(head.content_length);

    info!("{} {} ({} bytes)", head.method, head.path, body.len());
    let reply = api::route(&orchestrator, &head, &body).await;
    if reply.status >= 400 {
        warn!("{} {} -> {}", head.method, head.path, reply.status);
    } else {
        info!("{} {} -> {}", head.method, head.path, reply.status);
    }

    send(&mut stream, reply).await
}

async fn send(stream: &mut TcpStream, reply: HttpReply) -> Result<()> {
    stream.write_all(&reply.to_bytes()).await?;
    stream.flush().await?;
    Ok(())
}
