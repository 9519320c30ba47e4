//! Cut entity - One scene/shot of a story, numbered from 1

use serde::{Deserialize, Serialize};

use super::lenient::{lenient_u32, or_default, string_list};

/// A single cut of the story
///
/// Every field decodes leniently: a value of the wrong shape becomes the
/// field's default instead of failing the whole cut list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cut {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub cut_number: u32,
    #[serde(default, deserialize_with = "or_default")]
    pub description: String,
    /// English prompt for the image model
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub video_prompt: Option<String>,
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub character_tag: Option<String>,
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub physics_detail: Option<String>,
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub lighting_condition: Option<String>,
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub weather_atmosphere: Option<String>,
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub emotion_level: Option<EmotionLevel>,
    #[serde(default, deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Cut {
    pub fn new(cut_number: u32, description: impl Into<String>) -> Self {
        Self {
            cut_number,
            description: description.into(),
            ..Default::default()
        }
    }
}

/// Emotion intensity; the model emits a whole number, a fractional score or
/// a range label like "5-7"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmotionLevel {
    Level(u8),
    Score(f64),
    Label(String),
}

/// Render cuts as numbered lines, the story text format the remote stream produces
pub fn story_text(cuts: &[Cut]) -> String {
    cuts.iter()
        .map(|c| format!("{}. {}", c.cut_number, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_camel_case_with_optional_fields() {
        let json = r#"{"cutNumber": 2, "description": "비 오는 골목", "imagePrompt": "rainy alley", "emotionLevel": 6}"#;
        let cut: Cut = serde_json::from_str(json).unwrap();
        assert_eq!(cut.cut_number, 2);
        assert_eq!(cut.image_prompt.as_deref(), Some("rainy alley"));
        assert_eq!(cut.emotion_level, Some(EmotionLevel::Level(6)));
        assert!(cut.tags.is_empty());
    }

    #[test]
    fn test_emotion_level_accepts_labels() {
        let cut: Cut = serde_json::from_str(r#"{"cutNumber": 1, "emotionLevel": "5-7"}"#).unwrap();
        assert_eq!(cut.emotion_level, Some(EmotionLevel::Label("5-7".to_string())));
    }

    #[test]
    fn test_malformed_fields_fall_back_per_field() {
        let json = r#"{
            "cutNumber": "4",
            "description": null,
            "imagePrompt": ["not", "a", "string"],
            "emotionLevel": 6.5,
            "tags": "rain, night"
        }"#;
        let cut: Cut = serde_json::from_str(json).unwrap();
        assert_eq!(cut.cut_number, 4);
        assert_eq!(cut.description, "");
        assert_eq!(cut.image_prompt, None);
        assert_eq!(cut.emotion_level, Some(EmotionLevel::Score(6.5)));
        assert_eq!(cut.tags, vec!["rain", "night"]);

        let cut: Cut = serde_json::from_str(r#"{"cutNumber": 2, "emotionLevel": {"value": 3}}"#).unwrap();
        assert_eq!(cut.emotion_level, None);
    }

    #[test]
    fn test_story_text_numbers_lines() {
        let cuts = vec![Cut::new(1, "a"), Cut::new(2, "b")];
        assert_eq!(story_text(&cuts), "1. a\n2. b");
    }
}
