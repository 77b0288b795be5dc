//! Error types for Glean.

use thiserror::Error;

/// Library-level error type for Glean operations.
#[derive(Error, Debug)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transcripts are disabled for video {video_id}")]
    TranscriptsDisabled {
        video_id: String,
        attempts: Vec<String>,
    },

    #[error("No transcript available for video {video_id}")]
    NoTranscriptAvailable {
        video_id: String,
        attempts: Vec<String>,
    },

    #[error("AI provider is not configured: {0}")]
    ProviderUnconfigured(String),

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("Failed to parse AI response: {0}")]
    ResponseParse(String),

    #[error("Rate limit exceeded. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Glean operations.
pub type Result<T> = std::result::Result<T, GleanError>;
