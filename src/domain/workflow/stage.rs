//! Workflow stages

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::value_objects::RenderStyle;

/// One step of the five-step workflow, serialized as its index (0..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    #[default]
    ModeSelect,
    TopicSelect,
    StoryConfirm,
    Generating,
    TitleSelect,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::ModeSelect,
        Stage::TopicSelect,
        Stage::StoryConfirm,
        Stage::Generating,
        Stage::TitleSelect,
    ];

    pub fn index(&self) -> u8 {
        match self {
            Self::ModeSelect => 0,
            Self::TopicSelect => 1,
            Self::StoryConfirm => 2,
            Self::Generating => 3,
            Self::TitleSelect => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Display label of the stepper
    pub fn label(&self) -> &'static str {
        match self {
            Self::ModeSelect => "모드 선택",
            Self::TopicSelect => "주제 입력",
            Self::StoryConfirm => "스토리 확정",
            Self::Generating => "이미지 생성",
            Self::TitleSelect => "제목 선택",
        }
    }

    /// Stage reached by going back; animation stories skip topic selection both ways
    pub fn previous(&self, style: RenderStyle) -> Option<Self> {
        match self {
            Self::ModeSelect => None,
            Self::StoryConfirm if style.skips_topic_selection() => Some(Self::ModeSelect),
            other => Self::from_index(other.index() - 1),
        }
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u8::deserialize(deserializer)?;
        Self::from_index(index)
            .ok_or_else(|| serde::de::Error::custom(format!("stage out of range: {}", index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_index(stage.index()), Some(stage));
        }
        assert_eq!(Stage::from_index(5), None);
    }

    #[test]
    fn test_previous_mirrors_animation_skip() {
        assert_eq!(Stage::StoryConfirm.previous(RenderStyle::Animation), Some(Stage::ModeSelect));
        assert_eq!(Stage::StoryConfirm.previous(RenderStyle::Photoreal), Some(Stage::TopicSelect));
        assert_eq!(Stage::Generating.previous(RenderStyle::Animation), Some(Stage::StoryConfirm));
        assert_eq!(Stage::ModeSelect.previous(RenderStyle::Photoreal), None);
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Stage::Generating).unwrap(), "3");
        assert!(serde_json::from_str::<Stage>("7").is_err());
    }
}
