//! Side effects requested by the reducer

use super::{StreamKind, StreamToken};
use crate::domain::entities::{ControlAction, Cut, Draft};
use crate::domain::value_objects::{ContentFormat, InputMode, RenderStyle};

/// Topic parameters of a draft request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftQuery {
    pub format: ContentFormat,
    /// Empty unless the input mode is `category`
    pub category: String,
    /// Empty unless the input mode is `custom`
    pub custom_input: String,
}

impl DraftQuery {
    pub fn new(format: ContentFormat, input_mode: InputMode, category: &str, custom_input: &str) -> Self {
        let (category, custom_input) = match input_mode {
            InputMode::Category => (category.to_string(), String::new()),
            InputMode::Custom => (String::new(), custom_input.to_string()),
        };
        Self { format, category, custom_input }
    }
}

/// Draft a story should be expanded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    pub draft: Draft,
    pub format: ContentFormat,
}

/// Request for the first image, used as the character reference
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRequest {
    pub format: ContentFormat,
    pub style: RenderStyle,
    pub cut: Cut,
    pub character_prompt: String,
}

/// A full image generation job
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub format: ContentFormat,
    pub style: RenderStyle,
    pub topic: String,
    pub cuts: Vec<Cut>,
    pub title: String,
    pub character_prompt: String,
    pub reference_image: Option<String>,
}

/// Where the shell should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationTarget {
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenDraftStream { token: StreamToken, query: DraftQuery },
    /// Abort the live stream of this kind, if any
    CloseStream(StreamKind),
    RegenerateDraft { draft_id: u32, query: DraftQuery },
    PrepareStory { token: StreamToken, request: StoryRequest },
    OpenStoryStream { token: StreamToken, request_id: String },
    ParseScript { token: StreamToken, script: String, format: ContentFormat },
    ResolveGenerationSettings { token: StreamToken },
    GenerateReference { token: StreamToken, request: ReferenceRequest },
    QueueGeneration { token: StreamToken, job: GenerationJob },
    OpenGenerationStream { token: StreamToken, job_id: String },
    SendControl(ControlAction),
    FetchTitles { token: StreamToken, story_preview: String },
    Navigate(NavigationTarget),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenDraftStream { .. } => "open_draft_stream",
            Self::CloseStream(_) => "close_stream",
            Self::RegenerateDraft { .. } => "regenerate_draft",
            Self::PrepareStory { .. } => "prepare_story",
            Self::OpenStoryStream { .. } => "open_story_stream",
            Self::ParseScript { .. } => "parse_script",
            Self::ResolveGenerationSettings { .. } => "resolve_generation_settings",
            Self::GenerateReference { .. } => "generate_reference",
            Self::QueueGeneration { .. } => "queue_generation",
            Self::OpenGenerationStream { .. } => "open_generation_stream",
            Self::SendControl(_) => "send_control",
            Self::FetchTitles { .. } => "fetch_titles",
            Self::Navigate(_) => "navigate",
        }
    }
}
