//! Content format, rendering style and topic input choices made in the first stages

use serde::{Deserialize, Serialize};

/// Number of cuts in a long-form story
pub const LONG_FORM_CUTS: usize = 100;
/// Number of cuts in a short-form story
pub const SHORT_FORM_CUTS: usize = 20;

/// Topic categories offered in the topic selection stage
pub const CATEGORIES: [&str; 10] = [
    "사고·부상",
    "자연재해",
    "학대·방치·호딩",
    "보은 및 영웅적 행동",
    "도시형 고립",
    "유기 및 유실",
    "모성애",
    "장애 및 노령 동물의 생존",
    "종을 뛰어넘는 우정",
    "사회적 약자와의 동행",
];

/// Output format of the generated video story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// 16:9, 100 cuts
    #[default]
    Long,
    /// 9:16, 20 cuts
    Short,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }

    /// Fixed number of cuts a story of this format must have
    pub fn cut_count(&self) -> usize {
        match self {
            Self::Long => LONG_FORM_CUTS,
            Self::Short => SHORT_FORM_CUTS,
        }
    }

    /// Label the generation job expects as its `mode`
    pub fn job_label(&self) -> &'static str {
        match self {
            Self::Long => "Long Form (16:9)",
            Self::Short => "Short Form (9:16)",
        }
    }

    /// Output resolution as (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            Self::Long => (1920, 1080),
            Self::Short => (1080, 1920),
        }
    }

    /// Lenient parse used for records saved by older clients
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if lower == "long" || lower.starts_with("long form") {
            Some(Self::Long)
        } else if lower == "short" || lower.starts_with("short form") {
            Some(Self::Short)
        } else {
            None
        }
    }
}

/// Rendering style of the generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    #[default]
    Photoreal,
    /// Hand-authored script rendered as illustration
    Animation,
}

impl RenderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photoreal => "photoreal",
            Self::Animation => "animation",
        }
    }

    /// Animation stories are written by hand, so topic selection is skipped
    pub fn skips_topic_selection(&self) -> bool {
        matches!(self, Self::Animation)
    }
}

/// How the story topic is given in the topic selection stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Category,
    Custom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_count_per_format() {
        assert_eq!(ContentFormat::Long.cut_count(), 100);
        assert_eq!(ContentFormat::Short.cut_count(), 20);
    }

    #[test]
    fn test_from_label_accepts_job_labels() {
        assert_eq!(ContentFormat::from_label("Long Form (16:9)"), Some(ContentFormat::Long));
        assert_eq!(ContentFormat::from_label("short"), Some(ContentFormat::Short));
        assert_eq!(ContentFormat::from_label("square"), None);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&RenderStyle::Animation).unwrap();
        assert_eq!(json, "\"animation\"");
        let mode: InputMode = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(mode, InputMode::Custom);
    }
}
