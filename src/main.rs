use anyhow::Result;
use clap::{Parser, Subcommand};
use insight_router::agents::StructuredQueryAgent;
use insight_router::catalog::FieldCatalog;
use insight_router::config::AppConfig;
use insight_router::llm::LlmClient;
use insight_router::logging;
use insight_router::orchestrator::Orchestrator;
use insight_router::services::Ga4Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "insight-router")]
#[command(about = "Answer site-audit and web-analytics questions in plain language")]
struct Args {
    /// LLM API key (or set LITELLM_API_KEY / OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Path to the GA4 field allow-list (or set FIELD_CATALOG_PATH)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route a question and print the fused answer
    Ask {
        question: String,

        /// GA4 property id, required for traffic questions
        #[arg(short, long)]
        property_id: Option<String>,
    },
    /// Generate and validate a GA4 plan without running it
    Plan { question: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::from_lookup(|key| match (key, &args.api_key) {
        ("LITELLM_API_KEY", Some(key)) => Some(key.clone()),
        _ => std::env::var(key).ok(),
    })?;
    if let Some(path) = args.catalog {
        config.catalog_path = path;
    }
    logging::init(None)?;

    match args.command {
        Command::Ask {
            question,
            property_id,
        } => {
            let orchestrator = Orchestrator::from_config(&config).await?;
            let response = orchestrator
                .handle_query(&question, property_id.as_deref())
                .await?;
            info!("Answered with intent {}", response.intent);

            println!("\n=== Answer ===");
            println!("{}", response.answer);
        }
        Command::Plan { question } => {
            let catalog = Arc::new(FieldCatalog::load(&config.catalog_path)?);
            let llm = Arc::new(LlmClient::new(
                config.llm_api_key.clone(),
                config.llm_model.clone(),
                config.llm_base_url.clone(),
            ));
            // Planning never reaches the reporting API.
            let reporting = Arc::new(Ga4Client::new(
                config.google_access_token.clone().unwrap_or_default(),
            ));
            let agent = StructuredQueryAgent::new(llm, catalog, reporting);
            let plan = agent.plan_query(&question).await?;

            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(())
}
