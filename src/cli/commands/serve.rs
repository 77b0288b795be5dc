//! HTTP API server command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::server::{build_router, AppState};
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    for problem in preflight::problems(Operation::Serve, &settings) {
        Output::warning(&problem.to_string());
    }

    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = build_router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Glean API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Transcript", "POST   /api/transcript");
    Output::kv("Analyze", "POST   /api/analyze");
    Output::kv("Analyses", "GET    /api/analysis, POST /api/analysis");
    Output::kv("Analysis", "GET    /api/analysis/{id}, PUT, DELETE");
    Output::kv("Webhook", "POST   /api/webhooks/identity");
    Output::kv("Caller header", &settings.server.user_header);
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
