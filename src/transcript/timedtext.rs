//! Captions via the legacy `api/timedtext` endpoint.

use super::{
    parse_caption_xml, LanguagePreference, SourceError, SourceResult, TranscriptSegment,
    TranscriptSource,
};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument};
use url::Url;

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// A caption track as listed by `type=list`.
#[derive(Debug, Clone, PartialEq)]
struct ListedTrack {
    lang_code: String,
    name: Option<String>,
    is_default: bool,
}

/// Caption backend using the timedtext endpoint.
pub struct TimedTextSource {
    client: reqwest::Client,
}

impl TimedTextSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: Url) -> SourceResult<String> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn resolve_auto(&self, video_id: &str) -> SourceResult<ListedTrack> {
        let body = self.get(list_url(video_id)?).await?;
        let tracks = parse_track_list(&body)?;
        tracks
            .iter()
            .find(|t| t.is_default)
            .or_else(|| tracks.first())
            .cloned()
            .ok_or_else(|| SourceError::NoTranscript(LanguagePreference::Auto.to_string()))
    }
}

#[async_trait]
impl TranscriptSource for TimedTextSource {
    fn name(&self) -> &str {
        "timedtext"
    }

    #[instrument(skip(self), fields(language = %language))]
    async fn fetch(
        &self,
        video_id: &str,
        language: &LanguagePreference,
    ) -> SourceResult<Vec<TranscriptSegment>> {
        let track = match language {
            LanguagePreference::Specific(code) => ListedTrack {
                lang_code: code.clone(),
                name: None,
                is_default: false,
            },
            LanguagePreference::Auto => self.resolve_auto(video_id).await?,
        };
        debug!("Requesting timedtext track {}", track.lang_code);

        let body = self.get(track_url(video_id, &track)?).await?;
        if body.trim().is_empty() {
            return Err(SourceError::NoTranscript(track.lang_code));
        }

        parse_caption_xml(&body)
    }
}

fn list_url(video_id: &str) -> SourceResult<Url> {
    Url::parse_with_params(TIMEDTEXT_URL, &[("type", "list"), ("v", video_id)])
        .map_err(|e| SourceError::Parse(e.to_string()))
}

fn track_url(video_id: &str, track: &ListedTrack) -> SourceResult<Url> {
    let mut url = Url::parse_with_params(
        TIMEDTEXT_URL,
        &[("v", video_id), ("lang", track.lang_code.as_str())],
    )
    .map_err(|e| SourceError::Parse(e.to_string()))?;

    if let Some(name) = track.name.as_deref().filter(|n| !n.is_empty()) {
        url.query_pairs_mut().append_pair("name", name);
    }

    Ok(url)
}

fn parse_track_list(xml: &str) -> SourceResult<Vec<ListedTrack>> {
    let mut reader = Reader::from_str(xml);
    let mut tracks = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"track" => {
                let mut lang_code = None;
                let mut name = None;
                let mut is_default = false;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"lang_code" => lang_code = Some(value),
                        b"name" => name = Some(value),
                        b"lang_default" => is_default = value == "true",
                        _ => {}
                    }
                }
                if let Some(lang_code) = lang_code {
                    tracks.push(ListedTrack {
                        lang_code,
                        name,
                        is_default,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("track list: {}", e))),
            _ => {}
        }
    }

    Ok(tracks)
}
