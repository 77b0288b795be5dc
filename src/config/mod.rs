//! Configuration module for Glean.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, Prompts};
pub use settings::{
    AnalysisSettings, CaptionBackend, DatabaseSettings, PromptSettings, RateLimitSettings,
    ServerSettings, Settings, TranscriptSettings, WebhookSettings,
};
