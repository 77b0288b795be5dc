//! Transcript analysis through an OpenAI-compatible chat completion API.
//!
//! The provider is asked for a JSON object and the reply is parsed strictly into an
//! [`AnalysisReport`]. A reply that does not parse is an error; free text is never relayed.

mod requester;

pub use requester::{build_request, OpenAiAnalyzer};

use crate::error::{GleanError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured analysis of a video transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Core topic of the video.
    pub topic: String,
    /// Key points or insights.
    pub key_points: Vec<String>,
    /// Short summary.
    pub summary: String,
}

/// Something that can analyze transcript text.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze the full transcript text.
    async fn analyze(&self, transcript_text: &str) -> Result<AnalysisReport>;
}

/// Parse the provider's message content into a report.
pub fn parse_report(content: &str) -> Result<AnalysisReport> {
    let json = strip_code_fence(content.trim());

    let report: AnalysisReport = serde_json::from_str(json)
        .map_err(|e| GleanError::ResponseParse(format!("response is not a valid analysis: {}", e)))?;

    if report.topic.trim().is_empty() || report.summary.trim().is_empty() {
        return Err(GleanError::ResponseParse(
            "response is missing a topic or summary".to_string(),
        ));
    }

    Ok(report)
}

/// Some models wrap JSON in a Markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
