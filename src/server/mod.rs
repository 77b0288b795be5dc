//! HTTP API.
//!
//! Routes:
//! - `GET /health`
//! - `POST /api/transcript`, `POST /api/analyze`
//! - `GET|POST /api/analysis`, `GET|PUT|DELETE /api/analysis/{id}`
//! - `POST /api/webhooks/identity`

mod error;
mod handlers;

pub use error::ErrorBody;

use crate::analysis::{Analyzer, OpenAiAnalyzer};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::library::Library;
use crate::rate_limit::RateLimiter;
use crate::store::SqliteStore;
use crate::transcript::TranscriptFetcher;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub fetcher: Arc<TranscriptFetcher>,
    pub analyzer: Arc<dyn Analyzer>,
    pub store: Arc<SqliteStore>,
    pub library: Library,
    pub limiter: RateLimiter,
    /// Header carrying the authenticated user id.
    pub user_header: String,
    /// `None` when the signing secret is not configured.
    pub webhook_secret: Option<String>,
    pub webhook_secret_env: String,
    pub webhook_tolerance_secs: i64,
}

impl AppState {
    /// Assemble state from prebuilt collaborators.
    pub fn new(
        fetcher: Arc<TranscriptFetcher>,
        analyzer: Arc<dyn Analyzer>,
        store: Arc<SqliteStore>,
        settings: &Settings,
    ) -> Self {
        Self {
            fetcher,
            analyzer,
            library: Library::new(store.clone()),
            store,
            limiter: RateLimiter::from_settings(&settings.rate_limit),
            user_header: settings.server.user_header.to_ascii_lowercase(),
            webhook_secret: settings.webhook.secret().ok(),
            webhook_secret_env: settings.webhook.secret_env.clone(),
            webhook_tolerance_secs: settings.webhook.tolerance_secs,
        }
    }

    /// Build the production state: YouTube backends, the configured AI provider, SQLite on disk.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let analyzer = OpenAiAnalyzer::new(settings.analysis.clone(), prompts)?;

        let db_path = settings.database_path();
        let store = SqliteStore::new(&db_path)?;
        info!("Using database at {:?}", db_path);

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(analyzer),
            Arc::new(store),
            settings,
        ))
    }

    /// Override the webhook signing secret.
    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }
}

/// Build the API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/transcript", post(handlers::transcript))
        .route("/api/analyze", post(handlers::analyze))
        .route(
            "/api/analysis",
            get(handlers::list_analyses).post(handlers::create_analysis),
        )
        .route(
            "/api/analysis/{id}",
            get(handlers::get_analysis)
                .put(handlers::update_analysis)
                .delete(handlers::delete_analysis),
        )
        .route("/api/webhooks/identity", post(handlers::identity_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
