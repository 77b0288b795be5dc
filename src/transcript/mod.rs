//! Transcript acquisition for YouTube videos.
//!
//! Captions come from unofficial YouTube endpoints, so fetching is best-effort:
//! the [`TranscriptFetcher`] walks language preferences and caption backends,
//! retrying transient failures, until one of them yields a non-empty transcript.

mod captions;
mod fetcher;
mod innertube;
mod timedtext;
pub mod video_id;

pub use captions::parse_caption_xml;
pub use fetcher::TranscriptFetcher;
pub use innertube::InnerTubeSource;
pub use timedtext::TimedTextSource;
pub use video_id::{extract_video_id, watch_url};

use crate::config::{CaptionBackend, TranscriptSettings};
use crate::error::{GleanError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// A single caption cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start time in seconds.
    #[serde(default)]
    pub start: f64,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Join segment texts with single spaces, keeping order.
pub fn join_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which caption language to ask a backend for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguagePreference {
    /// A specific language code such as `en` or `th`.
    Specific(String),
    /// Whatever the video offers first.
    Auto,
}

impl std::fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguagePreference::Specific(code) => write!(f, "{}", code),
            LanguagePreference::Auto => write!(f, "auto"),
        }
    }
}

/// Build the preference list for the given language codes.
///
/// Codes are trimmed and deduplicated in order; `auto` (or an empty code) maps to
/// [`LanguagePreference::Auto`], which is always present and always last.
pub fn language_preferences<S: AsRef<str>>(codes: &[S]) -> Vec<LanguagePreference> {
    let mut prefs: Vec<LanguagePreference> = Vec::new();
    for code in codes {
        let code = code.as_ref().trim();
        if code.is_empty() || code.eq_ignore_ascii_case("auto") {
            continue;
        }
        let pref = LanguagePreference::Specific(code.to_string());
        if !prefs.contains(&pref) {
            prefs.push(pref);
        }
    }
    prefs.push(LanguagePreference::Auto);
    prefs
}

/// Failure reported by a single caption backend call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("transcripts are disabled for this video")]
    CaptionsDisabled,

    #[error("no transcript in language '{0}'")]
    NoTranscript(String),

    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("too many requests, YouTube is asking for a captcha")]
    RateLimited,

    #[error("caption track is empty")]
    Empty,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl SourceError {
    /// Whether retrying the same call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::RateLimited)
    }

    /// Whether the answer holds for every language on this backend.
    pub fn is_video_wide(&self) -> bool {
        matches!(
            self,
            SourceError::CaptionsDisabled | SourceError::VideoUnavailable(_)
        )
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            SourceError::RateLimited
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// A backend able to download captions for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Fetch the caption cues for a video in the requested language.
    async fn fetch(
        &self,
        video_id: &str,
        language: &LanguagePreference,
    ) -> SourceResult<Vec<TranscriptSegment>>;
}

/// Build an HTTP client for caption requests.
pub(crate) fn http_client(settings: &TranscriptSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.timeout())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| GleanError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Create the configured caption backends, in order.
pub fn create_sources(settings: &TranscriptSettings) -> Result<Vec<Arc<dyn TranscriptSource>>> {
    if settings.sources.is_empty() {
        return Err(GleanError::Config(
            "transcript.sources must name at least one caption backend".to_string(),
        ));
    }

    let client = http_client(settings)?;
    Ok(settings
        .sources
        .iter()
        .map(|backend| -> Arc<dyn TranscriptSource> {
            match backend {
                CaptionBackend::InnerTube => Arc::new(InnerTubeSource::new(client.clone())),
                CaptionBackend::TimedText => Arc::new(TimedTextSource::new(client.clone())),
            }
        })
        .collect())
}
