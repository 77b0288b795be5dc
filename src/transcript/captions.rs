//! Caption XML parsing.
//!
//! YouTube serves two XML shapes: the classic `<text start="s" dur="s">` cues and the
//! `srv3` format with `<p t="ms" d="ms">` paragraphs that may nest `<s>` spans.

use super::{SourceError, SourceResult, TranscriptSegment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Time unit of the cue attributes.
#[derive(Clone, Copy)]
enum Units {
    Seconds,
    Millis,
}

struct Cue {
    tag: Vec<u8>,
    start: f64,
    duration: f64,
    text: String,
}

/// Parse caption XML into ordered segments, skipping empty cues.
pub fn parse_caption_xml(xml: &str) -> SourceResult<Vec<TranscriptSegment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<Cue> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if current.is_none() {
                    current = start_cue(e);
                }
            }
            Ok(Event::Empty(ref e)) => {
                // <br/> inside a cue separates lines
                if e.name().as_ref() == b"br" {
                    if let Some(cue) = current.as_mut() {
                        cue.text.push(' ');
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(cue) = current.as_mut() {
                    let raw = e
                        .unescape()
                        .map_err(|err| SourceError::Parse(format!("bad caption text: {}", err)))?;
                    cue.text.push_str(&raw);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(cue) = current.as_mut() {
                    cue.text.push_str(&String::from_utf8_lossy(&e.clone().into_inner()));
                }
            }
            Ok(Event::End(ref e)) => {
                let closes_cue = current
                    .as_ref()
                    .is_some_and(|cue| cue.tag.as_slice() == e.name().as_ref());
                if closes_cue {
                    if let Some(cue) = current.take() {
                        let text = clean_text(&cue.text);
                        if !text.is_empty() {
                            segments.push(TranscriptSegment {
                                text,
                                start: cue.start,
                                duration: cue.duration,
                            });
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SourceError::Parse(format!(
                    "error parsing caption XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(segments)
}

fn start_cue(e: &BytesStart<'_>) -> Option<Cue> {
    let (units, start_key, dur_key) = match e.name().as_ref() {
        b"text" => (Units::Seconds, b"start".as_slice(), b"dur".as_slice()),
        b"p" => (Units::Millis, b"t".as_slice(), b"d".as_slice()),
        _ => return None,
    };

    let mut start = None;
    let mut duration = 0.0;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        if attr.key.as_ref() == start_key {
            start = value.parse::<f64>().ok();
        } else if attr.key.as_ref() == dur_key {
            duration = value.parse::<f64>().unwrap_or(0.0);
        }
    }

    let start = start?;
    let scale = match units {
        Units::Seconds => 1.0,
        Units::Millis => 0.001,
    };

    Some(Cue {
        tag: e.name().as_ref().to_vec(),
        start: start * scale,
        duration: duration * scale,
        text: String::new(),
    })
}

/// Decode leftover HTML entities (captions are often double-escaped) and collapse whitespace.
fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
