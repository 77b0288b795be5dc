//! CLI command implementations.

mod analyze;
mod config;
mod serve;
mod transcript;

pub use analyze::run_analyze;
pub use config::run_config;
pub use serve::run_serve;
pub use transcript::run_transcript;

use crate::config::Settings;
use crate::transcript::{language_preferences, TranscriptFetcher, TranscriptSegment};
use anyhow::Result;

/// Fetch a transcript from the CLI, honoring `--lang` overrides.
async fn fetch_transcript(
    video_id: &str,
    langs: &[String],
    settings: &Settings,
) -> Result<Vec<TranscriptSegment>> {
    let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;

    let segments = if langs.is_empty() {
        fetcher.fetch(video_id).await?
    } else {
        fetcher
            .fetch_with_languages(video_id, &language_preferences(langs))
            .await?
    };

    Ok(segments)
}
