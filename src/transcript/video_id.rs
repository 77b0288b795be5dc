//! YouTube URL normalization.

use crate::error::{GleanError, Result};
use regex::Regex;
use std::sync::LazyLock;

// Watch, short, embed, legacy /v/, shorts and live links. The trailing group rejects ids
// that run longer than 11 characters.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?:https?://)?
        (?:www\.|m\.)?
        (?:
            youtube(?:-nocookie)?\.com/
            (?:
                watch\?(?:\S*&)?v=
                | embed/
                | v/
                | shorts/
                | live/
            )
            | youtu\.be/
        )
        ([a-z0-9_-]{11})
        (?:[^a-z0-9_-]|$)
    ",
    )
    .expect("valid video URL regex")
});

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

/// Extract the 11-character video id from a YouTube URL or bare id.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(id) = URL_PATTERN
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
    {
        return Ok(id);
    }

    if BARE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(GleanError::InvalidUrl(input.to_string()))
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
