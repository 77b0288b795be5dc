//! Language/backend/retry loop around the caption backends.

use super::{
    create_sources, language_preferences, LanguagePreference, SourceError, TranscriptSegment,
    TranscriptSource,
};
use crate::config::TranscriptSettings;
use crate::error::{GleanError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fetches a transcript by trying every language preference on every backend.
pub struct TranscriptFetcher {
    sources: Vec<Arc<dyn TranscriptSource>>,
    languages: Vec<LanguagePreference>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl TranscriptFetcher {
    /// Create a fetcher over the given backends.
    pub fn new(sources: Vec<Arc<dyn TranscriptSource>>, settings: &TranscriptSettings) -> Self {
        Self {
            sources,
            languages: language_preferences(settings.languages.as_slice()),
            max_attempts: settings.max_attempts.max(1),
            retry_delay: settings.retry_delay(),
        }
    }

    /// Create a fetcher over the backends named in the settings.
    pub fn from_settings(settings: &TranscriptSettings) -> Result<Self> {
        Ok(Self::new(create_sources(settings)?, settings))
    }

    /// Default language preferences, `Auto` last.
    pub fn languages(&self) -> &[LanguagePreference] {
        &self.languages
    }

    /// Fetch with the configured language preferences.
    pub async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        self.fetch_with_languages(video_id, &self.languages).await
    }

    /// Fetch with an explicit language ordering.
    ///
    /// Returns the first non-empty transcript. When every option fails the error is
    /// [`GleanError::TranscriptsDisabled`] if any backend reported disabled captions,
    /// otherwise [`GleanError::NoTranscriptAvailable`]; both carry per-attempt diagnostics.
    #[instrument(skip(self, languages), fields(video_id = %video_id))]
    pub async fn fetch_with_languages(
        &self,
        video_id: &str,
        languages: &[LanguagePreference],
    ) -> Result<Vec<TranscriptSegment>> {
        let mut attempts = Vec::new();
        let mut disabled = false;
        // Backends that gave an answer valid for every language.
        let mut settled: HashSet<usize> = HashSet::new();

        for language in languages {
            for (index, source) in self.sources.iter().enumerate() {
                if settled.contains(&index) {
                    continue;
                }

                for attempt in 1..=self.max_attempts {
                    let error = match source.fetch(video_id, language).await {
                        Ok(segments) if !segments.is_empty() => {
                            info!(
                                "Fetched {} segments via {} [{}]",
                                segments.len(),
                                source.name(),
                                language
                            );
                            return Ok(segments);
                        }
                        Ok(_) => SourceError::Empty,
                        Err(e) => e,
                    };

                    debug!(
                        "{} [{}] attempt {} failed: {}",
                        source.name(),
                        language,
                        attempt,
                        error
                    );
                    attempts.push(format!(
                        "{} [{}] attempt {}: {}",
                        source.name(),
                        language,
                        attempt,
                        error
                    ));

                    if error == SourceError::CaptionsDisabled {
                        disabled = true;
                    }
                    if error.is_video_wide() {
                        settled.insert(index);
                    }
                    if !error.is_transient() {
                        break;
                    }
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                }
            }
        }

        warn!(
            "No transcript for {} after {} attempts",
            video_id,
            attempts.len()
        );

        let video_id = video_id.to_string();
        if disabled {
            Err(GleanError::TranscriptsDisabled { video_id, attempts })
        } else {
            Err(GleanError::NoTranscriptAvailable { video_id, attempts })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::SourceResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays scripted results and records each call's language.
    struct ScriptedSource {
        name: String,
        script: Mutex<VecDeque<SourceResult<Vec<TranscriptSegment>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(name: &str, script: Vec<SourceResult<Vec<TranscriptSegment>>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscriptSource for ScriptedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(
            &self,
            _video_id: &str,
            language: &LanguagePreference,
        ) -> SourceResult<Vec<TranscriptSegment>> {
            self.calls.lock().unwrap().push(language.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(SourceError::NoTranscript(language.to_string())))
        }
    }

    fn as_source(source: &Arc<ScriptedSource>) -> Arc<dyn TranscriptSource> {
        source.clone()
    }

    fn settings(languages: &[&str], max_attempts: u32) -> TranscriptSettings {
        TranscriptSettings {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            max_attempts,
            retry_delay_ms: 0,
            ..TranscriptSettings::default()
        }
    }

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("hello", 0.0, 1.5),
            TranscriptSegment::new("world", 1.5, 2.0),
        ]
    }

    #[tokio::test]
    async fn test_first_language_wins() {
        let source = ScriptedSource::new("a", vec![Ok(segments())]);
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["th", "en"], 3));

        let result = fetcher.fetch("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(result, segments());
        assert_eq!(source.calls(), vec!["th"]);
    }

    #[tokio::test]
    async fn test_falls_through_languages_in_order() {
        let source = ScriptedSource::new(
            "a",
            vec![
                Err(SourceError::NoTranscript("th".to_string())),
                Err(SourceError::NoTranscript("en".to_string())),
                Ok(segments()),
            ],
        );
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["th", "en"], 3));

        let result = fetcher.fetch("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(source.calls(), vec!["th", "en", "auto"]);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let source = ScriptedSource::new(
            "a",
            vec![
                Err(SourceError::Transport("timeout".to_string())),
                Err(SourceError::RateLimited),
                Ok(segments()),
            ],
        );
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["en"], 3));

        assert!(fetcher.fetch("dQw4w9WgXcQ").await.is_ok());
        assert_eq!(source.calls(), vec!["en", "en", "en"]);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let source = ScriptedSource::new(
            "a",
            vec![
                Err(SourceError::Transport("reset".to_string())),
                Err(SourceError::Transport("reset".to_string())),
                Err(SourceError::Transport("reset".to_string())),
                Ok(segments()),
            ],
        );
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["en"], 3));

        // Three tries on "en", then the fourth call is the "auto" preference.
        assert!(fetcher.fetch("dQw4w9WgXcQ").await.is_ok());
        assert_eq!(source.calls(), vec!["en", "en", "en", "auto"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_a_failure() {
        let source = ScriptedSource::new("a", vec![Ok(Vec::new()), Ok(segments())]);
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["en"], 3));

        let result = fetcher.fetch("dQw4w9WgXcQ").await.unwrap();
        assert!(!result.is_empty());
        // An empty track is not retried; the next preference is tried instead.
        assert_eq!(source.calls(), vec!["en", "auto"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_second_backend() {
        let first = ScriptedSource::new(
            "first",
            vec![Err(SourceError::VideoUnavailable("private".to_string()))],
        );
        let second = ScriptedSource::new("second", vec![Ok(segments())]);
        let fetcher = TranscriptFetcher::new(
            vec![as_source(&first), as_source(&second)],
            &settings(&["en"], 3),
        );

        assert!(fetcher.fetch("dQw4w9WgXcQ").await.is_ok());
        assert_eq!(first.calls(), vec!["en"]);
        assert_eq!(second.calls(), vec!["en"]);
    }

    #[tokio::test]
    async fn test_disabled_captions_are_distinct() {
        let source = ScriptedSource::new("a", vec![Err(SourceError::CaptionsDisabled)]);
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["th", "en"], 3));

        let err = fetcher.fetch("dQw4w9WgXcQ").await.unwrap_err();
        match err {
            GleanError::TranscriptsDisabled { video_id, attempts } => {
                assert_eq!(video_id, "dQw4w9WgXcQ");
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].contains("disabled"));
            }
            other => panic!("expected TranscriptsDisabled, got {:?}", other),
        }
        // A disabled answer holds for every language, so the backend is not asked again.
        assert_eq!(source.calls(), vec!["th"]);
    }

    #[tokio::test]
    async fn test_no_transcript_found() {
        let source = ScriptedSource::new("a", Vec::new());
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["th", "en"], 3));

        let err = fetcher.fetch("dQw4w9WgXcQ").await.unwrap_err();
        match err {
            GleanError::NoTranscriptAvailable { attempts, .. } => {
                assert_eq!(attempts.len(), 3);
                assert!(attempts[0].starts_with("a [th] attempt 1"));
                assert!(attempts[2].starts_with("a [auto] attempt 1"));
            }
            other => panic!("expected NoTranscriptAvailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_explicit_language_override() {
        let source = ScriptedSource::new("a", vec![Ok(segments())]);
        let fetcher = TranscriptFetcher::new(vec![as_source(&source)], &settings(&["en"], 3));

        let languages = language_preferences(&["de"]);
        fetcher
            .fetch_with_languages("dQw4w9WgXcQ", &languages)
            .await
            .unwrap();
        assert_eq!(source.calls(), vec!["de"]);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let fetcher = TranscriptFetcher::new(Vec::new(), &settings(&["en"], 0));
        assert_eq!(fetcher.max_attempts, 1);
        assert_eq!(fetcher.languages().len(), 2);
    }
}
