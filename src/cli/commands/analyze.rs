//! Analyze command implementation.

use super::fetch_transcript;
use crate::analysis::{Analyzer, OpenAiAnalyzer};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::transcript::{extract_video_id, join_text, watch_url};
use anyhow::{bail, Result};

/// Fetch a transcript, summarize it, and print the report.
pub async fn run_analyze(url: &str, langs: &[String], settings: &Settings) -> Result<()> {
    preflight::check(Operation::Analyze, settings)?;

    let video_id = extract_video_id(url)?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let analyzer = OpenAiAnalyzer::new(settings.analysis.clone(), prompts)?;

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let fetched = fetch_transcript(&video_id, langs, settings).await;
    spinner.finish_and_clear();
    let segments = fetched?;

    let text = join_text(&segments);
    if text.is_empty() {
        bail!("Transcript for {} has no text", video_id);
    }

    let spinner = Output::spinner(&format!("Analyzing with {}...", settings.analysis.model));
    let analyzed = analyzer.analyze(&text).await;
    spinner.finish_and_clear();
    let report = analyzed?;

    Output::header(&report.topic);
    Output::kv("Video", &watch_url(&video_id));
    Output::kv("Segments", &segments.len().to_string());

    Output::header("Key points");
    for point in &report.key_points {
        Output::list_item(point);
    }

    Output::header("Summary");
    println!("{}", report.summary);

    Ok(())
}
