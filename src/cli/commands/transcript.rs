//! Transcript command implementation.

use super::fetch_transcript;
use crate::cli::{Output, TranscriptFormat};
use crate::config::Settings;
use crate::transcript::extract_video_id;
use anyhow::Result;
use serde_json::json;

/// Fetch a transcript and print it.
pub async fn run_transcript(
    url: &str,
    langs: &[String],
    format: TranscriptFormat,
    settings: &Settings,
) -> Result<()> {
    let video_id = extract_video_id(url)?;

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let result = fetch_transcript(&video_id, langs, settings).await;
    spinner.finish_and_clear();
    let segments = result?;

    match format {
        TranscriptFormat::Text => {
            for segment in &segments {
                Output::segment(segment.start, &segment.text);
            }
        }
        TranscriptFormat::Json => {
            let body = json!({ "videoId": video_id, "transcript": segments });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
