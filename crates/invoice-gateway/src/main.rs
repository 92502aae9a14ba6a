//! invoice-gateway HTTP Server
//!
//! Axum-based server exposing the invoice agent over a small REST API.
//! Each `POST /api/chat` runs one orchestrated turn: the model may call the
//! invoice and documentation tools before it answers.

mod cli;
mod cors;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{LlmProvider, OrchestratorBuilder, SystemPrompt};
use agent_runtime::{Backend, BackendConfig, ProviderKind};
use invoice_tools::{
    FileDocumentation, HttpInvoiceClient, INVOICE_AGENT_PROMPT, InMemoryInvoiceService, InvoiceService,
};

use crate::cli::Cli;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before flags read their env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize LLM backend
    let kind: ProviderKind = cli.provider.parse()?;
    let mut backend_config = BackendConfig::from_env(kind, cli.model.clone(), cli.backend_timeout())?;
    if let Some(url) = &cli.backend_url {
        backend_config = backend_config.with_base_url(url);
    }
    let backend = Arc::new(Backend::from_config(&backend_config)?);

    match backend.health_check().await {
        Ok(true) => tracing::info!(provider = %kind, "✓ Connected to LLM backend"),
        Ok(false) | Err(_) => tracing::warn!(
            provider = %kind,
            url = %backend_config.base_url,
            "⚠ LLM backend not reachable - chat requests will fail"
        ),
    }

    // Initialize collaborators
    let invoices: Arc<dyn InvoiceService> = if cli.demo_invoices {
        tracing::info!("Serving the built-in demo invoice book");
        Arc::new(InMemoryInvoiceService::seeded())
    } else {
        Arc::new(
            HttpInvoiceClient::new(&cli.invoice_api_url, invoice_tools::client::DEFAULT_TIMEOUT)
                .context("invalid --invoice-api-url")?,
        )
    };

    let docs = FileDocumentation::new(&cli.docs_dir);
    if !docs.root().is_dir() {
        tracing::warn!(dir = %docs.root().display(), "⚠ Documentation directory missing - page lookups return null");
    }

    // Initialize tools
    let tools = invoice_tools::registry(invoices, Arc::new(docs))?;
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let orchestrator = OrchestratorBuilder::new()
        .provider(backend)
        .tools(tools)
        .model(backend_config.model.clone())
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_output_tokens)
        .max_tool_rounds(cli.max_tool_rounds)
        .tool_concurrency(cli.tool_concurrency)
        .build()?;

    // Build application state
    let state = AppState::new(
        orchestrator,
        SystemPrompt::with_system_clock(INVOICE_AGENT_PROMPT),
        cli.request_timeout(),
    );

    // Build router
    let app = handlers::router(state)
        .layer(cors::local_only())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 invoice-gateway running on http://{}", cli.bind);
    tracing::info!("   provider: {}  model: {}", kind, backend_config.model);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  POST /api/chat  - Run one agent turn");

    axum::serve(listener, app).await?;

    Ok(())
}
