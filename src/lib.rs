//! Glean - YouTube transcripts and AI summaries
//!
//! Fetch a video's caption transcript, summarize it with an OpenAI-compatible
//! chat model, and keep per-user saved analyses behind a small HTTP API.
//!
//! # Architecture
//!
//! - `transcript` - URL normalization and caption retrieval with language/backend fallback
//! - `analysis` - Structured summaries from the AI provider
//! - `rate_limit` - Per-caller admission for the analysis endpoint
//! - `store` - SQLite persistence for analyses and mirrored users
//! - `library` - Owner-scoped operations on saved analyses
//! - `webhook` - Identity provider webhook verification
//! - `server` - HTTP routes
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use glean::config::Settings;
//! use glean::transcript::{extract_video_id, join_text, TranscriptFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;
//!
//!     let video_id = extract_video_id("https://youtu.be/dQw4w9WgXcQ")?;
//!     let segments = fetcher.fetch(&video_id).await?;
//!     println!("{}", join_text(&segments));
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod openai;
pub mod rate_limit;
pub mod server;
pub mod store;
pub mod transcript;
pub mod webhook;

pub use error::{GleanError, Result};
