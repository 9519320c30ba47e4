//! Decoding of raw server-sent events into typed stream events
//!
//! The draft and story streams use named events. The progress stream sends
//! unnamed (`message`) events whose JSON `type` field carries the name; both
//! forms decode to the same event. Unknown names decode to `None`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::application::ports::outbound::RemoteError;
use crate::domain::entities::{Draft, GenerationResult};
use crate::domain::workflow::{DraftStreamEvent, GenerationStreamEvent, StoryOutline, StoryStreamEvent};

/// Default event name of a server-sent event without an `event:` field
pub const MESSAGE_EVENT: &str = "message";

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub event: String,
    pub data: String,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
        serde_json::from_str(&self.data)
            .map_err(|e| RemoteError::Decode(format!("{} event: {}", self.event, e)))
    }

    /// `error` events may carry a JSON body, plain text, or nothing
    fn error_text(&self, field: &str) -> String {
        serde_json::from_str::<serde_json::Value>(&self.data)
            .ok()
            .and_then(|v| v.get(field).and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| {
                if self.data.trim().is_empty() {
                    "알 수 없는 오류".to_string()
                } else {
                    self.data.clone()
                }
            })
    }
}

#[derive(Deserialize)]
struct DeltaData {
    #[serde(default)]
    draft_id: u32,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct CompleteData {
    #[serde(default)]
    total: u32,
}

pub fn decode_draft_event(raw: &RawEvent) -> Result<Option<DraftStreamEvent>, RemoteError> {
    let event = match raw.event.as_str() {
        "delta" => {
            let data: DeltaData = raw.json()?;
            DraftStreamEvent::Delta {
                draft_id: data.draft_id,
                text: data.text,
            }
        }
        "draft" => DraftStreamEvent::Draft(raw.json::<Draft>()?),
        "complete" => {
            let total = raw.json::<CompleteData>().map(|c| c.total).unwrap_or_default();
            DraftStreamEvent::Complete { total }
        }
        "error" => DraftStreamEvent::Error {
            error: raw.error_text("error"),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

pub fn decode_story_event(raw: &RawEvent) -> Result<Option<StoryStreamEvent>, RemoteError> {
    let event = match raw.event.as_str() {
        "delta" => {
            let data: DeltaData = raw.json()?;
            StoryStreamEvent::Delta { text: data.text }
        }
        "complete" => StoryStreamEvent::Complete(raw.json::<StoryOutline>()?),
        "error" => StoryStreamEvent::Error {
            error: raw.error_text("error"),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressData {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    cut_index: Option<u32>,
    #[serde(default)]
    data: Option<GenerationResult>,
    #[serde(default)]
    result: Option<GenerationResult>,
}

pub fn decode_generation_event(raw: &RawEvent) -> Result<Option<GenerationStreamEvent>, RemoteError> {
    // A bare `error` event without a body is a transport-level failure report
    if raw.event == "error" && raw.data.trim().is_empty() {
        return Ok(Some(GenerationStreamEvent::Error {
            message: raw.error_text("message"),
        }));
    }

    let data: ProgressData = raw.json()?;
    let name = if raw.event == MESSAGE_EVENT {
        data.kind.clone().unwrap_or_default()
    } else {
        raw.event.clone()
    };

    let event = match name.as_str() {
        "log" => GenerationStreamEvent::Log {
            message: data.message.unwrap_or_default(),
            cut_index: data.cut_index,
        },
        "preview" => match data.image {
            Some(image) => GenerationStreamEvent::Preview {
                image,
                cut_index: data.cut_index,
            },
            None => return Ok(None),
        },
        "result" => match data.data.or(data.result) {
            Some(result) => GenerationStreamEvent::Result(result),
            None => return Ok(None),
        },
        "done" => GenerationStreamEvent::Done(data.result.or(data.data)),
        "error" => GenerationStreamEvent::Error {
            message: data.message.unwrap_or_else(|| raw.error_text("error")),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}
