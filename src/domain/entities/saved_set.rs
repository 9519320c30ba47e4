//! Saved set entity - A named snapshot of a draft list or a confirmed story

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::lenient::or_default;
use super::{Cut, Draft};
use crate::domain::value_objects::{ContentFormat, InputMode, SavedSetId};

/// Which of the two saved lists a set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavedSetKind {
    Draft,
    Story,
}

impl SavedSetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Story => "story",
        }
    }

    /// Fixed key the list is stored under
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Draft => "akitect_drafts_list",
            Self::Story => "akitect_stories_list",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        match key {
            "akitect_drafts_list" => Some(Self::Draft),
            "akitect_stories_list" => Some(Self::Story),
            _ => None,
        }
    }

    /// Default name offered in the save dialog
    pub fn default_name(&self, now: DateTime<Utc>) -> String {
        let prefix = match self {
            Self::Draft => "초안",
            Self::Story => "스토리",
        };
        format!("{}_{}", prefix, now.format("%Y. %-m. %-d."))
    }
}

impl std::str::FromStr for SavedSetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" | "drafts" => Ok(Self::Draft),
            "story" | "stories" => Ok(Self::Story),
            other => Self::from_storage_key(other).ok_or_else(|| format!("Unknown saved set kind: {}", other)),
        }
    }
}

/// Topic inputs and the draft list of the topic selection stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSetSnapshot {
    #[serde(default, deserialize_with = "or_default")]
    pub category: String,
    #[serde(default, deserialize_with = "or_default")]
    pub input_mode: InputMode,
    #[serde(default, deserialize_with = "or_default")]
    pub custom_input: String,
    #[serde(default, deserialize_with = "or_default")]
    pub drafts: Vec<Draft>,
}

/// A confirmed story ready for image generation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySnapshot {
    #[serde(rename = "mode", default, deserialize_with = "lenient_format")]
    pub format: ContentFormat,
    #[serde(default, deserialize_with = "or_default")]
    pub selected_draft: Option<Draft>,
    #[serde(default, deserialize_with = "or_default")]
    pub cuts: Vec<Cut>,
    #[serde(default, deserialize_with = "or_default")]
    pub character_prompt: String,
    #[serde(default, deserialize_with = "or_default")]
    pub edited_story: String,
}

/// Snapshot content of a saved set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SavedPayload {
    #[serde(rename = "draft")]
    Drafts(DraftSetSnapshot),
    #[serde(rename = "story")]
    Story(StorySnapshot),
}

impl SavedPayload {
    pub fn kind(&self) -> SavedSetKind {
        match self {
            Self::Drafts(_) => SavedSetKind::Draft,
            Self::Story(_) => SavedSetKind::Story,
        }
    }

    /// Decode a payload of a known kind, coercing mismatched fields to defaults
    pub fn from_value(kind: SavedSetKind, value: serde_json::Value) -> Self {
        match kind {
            SavedSetKind::Draft => Self::Drafts(serde_json::from_value(value).unwrap_or_default()),
            SavedSetKind::Story => Self::Story(serde_json::from_value(value).unwrap_or_default()),
        }
    }
}

/// A named, timestamped snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSet {
    pub id: SavedSetId,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub payload: SavedPayload,
}

impl SavedSet {
    pub fn new(name: impl Into<String>, payload: SavedPayload) -> Self {
        Self {
            id: SavedSetId::new(),
            name: name.into(),
            saved_at: Utc::now(),
            payload,
        }
    }

    pub fn kind(&self) -> SavedSetKind {
        self.payload.kind()
    }

    /// Build a set from a record written by the browser console
    ///
    /// Records are `{title, savedAt, ...payload}`. Anything that does not fit
    /// falls back to defaults rather than failing the import.
    pub fn from_legacy(kind: SavedSetKind, record: serde_json::Value) -> Self {
        let name = record
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let saved_at = record
            .get("savedAt")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let payload_value = if record.is_object() {
            record
        } else {
            serde_json::Value::Object(Default::default())
        };

        Self {
            id: SavedSetId::new(),
            name,
            saved_at,
            payload: SavedPayload::from_value(kind, payload_value),
        }
    }
}

fn lenient_format<'de, D>(deserializer: D) -> Result<ContentFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(ContentFormat::from_label)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_story_record_round_trips_fields() {
        let record = json!({
            "title": "스토리_2025. 1. 3.",
            "mode": "short",
            "selectedDraft": {"id": 3, "title": "t", "summary": "s", "theme": "x"},
            "cuts": [{"cutNumber": 1, "description": "d"}],
            "characterPrompt": "a shiba inu",
            "editedStory": "1. d",
            "savedAt": "2025-01-03T09:00:00.000Z"
        });

        let set = SavedSet::from_legacy(SavedSetKind::Story, record);
        assert_eq!(set.name, "스토리_2025. 1. 3.");
        assert_eq!(set.kind(), SavedSetKind::Story);
        let SavedPayload::Story(story) = set.payload else {
            panic!("expected story payload");
        };
        assert_eq!(story.format, ContentFormat::Short);
        assert_eq!(story.selected_draft.map(|d| d.id), Some(3));
        assert_eq!(story.cuts.len(), 1);
        assert_eq!(story.character_prompt, "a shiba inu");
    }

    #[test]
    fn test_mismatched_legacy_record_coerces_to_defaults() {
        let record = json!({"title": 5, "cuts": "not a list", "mode": 42, "characterPrompt": null});
        let set = SavedSet::from_legacy(SavedSetKind::Story, record);

        assert_eq!(set.name, "");
        let SavedPayload::Story(story) = set.payload else {
            panic!("expected story payload");
        };
        assert_eq!(story.format, ContentFormat::Long);
        assert!(story.cuts.is_empty());
        assert_eq!(story.character_prompt, "");
    }

    #[test]
    fn test_non_object_record_becomes_empty_draft_set() {
        let set = SavedSet::from_legacy(SavedSetKind::Draft, json!("garbage"));
        assert_eq!(set.payload, SavedPayload::Drafts(DraftSetSnapshot::default()));
    }

    #[test]
    fn test_payload_json_round_trip_keeps_kind() {
        let payload = SavedPayload::Drafts(DraftSetSnapshot {
            category: "모성애".to_string(),
            input_mode: InputMode::Category,
            custom_input: String::new(),
            drafts: vec![Draft::new(1, "t", "s")],
        });
        let json = serde_json::to_value(&payload).unwrap();
        let back = SavedPayload::from_value(SavedSetKind::Draft, json);
        assert_eq!(back, payload);
    }

    #[test]
    fn test_kind_parses_storage_keys() {
        assert_eq!("akitect_stories_list".parse::<SavedSetKind>(), Ok(SavedSetKind::Story));
        assert_eq!("draft".parse::<SavedSetKind>(), Ok(SavedSetKind::Draft));
        assert!("other".parse::<SavedSetKind>().is_err());
    }
}
