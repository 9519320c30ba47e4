//! Actions accepted by the workflow reducer

use serde::{Deserialize, Serialize};

use super::{
    DraftStreamEvent, Failure, GenerationStreamEvent, ParsedScript, StoryStreamEvent, StreamToken,
};
use crate::domain::entities::{
    ControlAction, Draft, DraftSetSnapshot, StorySnapshot, TitleSuggestion,
};
use crate::domain::value_objects::{ContentFormat, InputMode, RenderStyle};

/// Actions a user can take from the console shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    SetFormat { format: ContentFormat },
    SetStyle { style: RenderStyle },
    ConfirmMode,
    GoBack,
    SetInputMode { mode: InputMode },
    SetCategory { category: String },
    SetCustomInput { text: String },
    FetchDrafts,
    RegenerateDraft { draft_id: u32 },
    SelectDraft { draft_id: u32 },
    EditDraft { title: String, summary: String },
    CloseDraftDetail,
    StartStoryStream,
    StopStoryStream,
    EditStory { text: String },
    EditCharacterPrompt { text: String },
    ParseScript,
    StartGeneration,
    AttachReferenceImage { url: String },
    ConfirmReference,
    RegenerateReference,
    ControlGeneration { action: ControlAction },
    RetryTitles,
    SelectTitle { title: String },
    CompleteWorkflow,
    ResetWorkflow,
    DismissNotice,
    LoadDraftSet { set: DraftSetSnapshot },
    LoadStorySet { story: StorySnapshot },
}

impl UserAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetFormat { .. } => "set_format",
            Self::SetStyle { .. } => "set_style",
            Self::ConfirmMode => "confirm_mode",
            Self::GoBack => "go_back",
            Self::SetInputMode { .. } => "set_input_mode",
            Self::SetCategory { .. } => "set_category",
            Self::SetCustomInput { .. } => "set_custom_input",
            Self::FetchDrafts => "fetch_drafts",
            Self::RegenerateDraft { .. } => "regenerate_draft",
            Self::SelectDraft { .. } => "select_draft",
            Self::EditDraft { .. } => "edit_draft",
            Self::CloseDraftDetail => "close_draft_detail",
            Self::StartStoryStream => "start_story_stream",
            Self::StopStoryStream => "stop_story_stream",
            Self::EditStory { .. } => "edit_story",
            Self::EditCharacterPrompt { .. } => "edit_character_prompt",
            Self::ParseScript => "parse_script",
            Self::StartGeneration => "start_generation",
            Self::AttachReferenceImage { .. } => "attach_reference_image",
            Self::ConfirmReference => "confirm_reference",
            Self::RegenerateReference => "regenerate_reference",
            Self::ControlGeneration { .. } => "control_generation",
            Self::RetryTitles => "retry_titles",
            Self::SelectTitle { .. } => "select_title",
            Self::CompleteWorkflow => "complete_workflow",
            Self::ResetWorkflow => "reset_workflow",
            Self::DismissNotice => "dismiss_notice",
            Self::LoadDraftSet { .. } => "load_draft_set",
            Self::LoadStorySet { .. } => "load_story_set",
        }
    }
}

/// Outcomes of effects, fed back into the reducer by the session
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    DraftStream { token: StreamToken, event: DraftStreamEvent },
    DraftRegenerated { draft_id: u32, result: Result<Draft, Failure> },
    StoryPrepared { token: StreamToken, result: Result<String, Failure> },
    StoryStream { token: StreamToken, event: StoryStreamEvent },
    ScriptParsed { token: StreamToken, result: Result<ParsedScript, Failure> },
    /// `None` when the settings could not be read
    GenerationSettingsResolved { token: StreamToken, use_reference_image: Option<bool> },
    ReferenceGenerated { token: StreamToken, result: Result<String, Failure> },
    GenerationQueued { token: StreamToken, result: Result<String, Failure> },
    GenerationStream { token: StreamToken, event: GenerationStreamEvent },
    /// A stream ended without a terminal event, or its transport failed
    StreamEnded { token: StreamToken, error: Option<String> },
    TitlesFetched { token: StreamToken, result: Result<Vec<TitleSuggestion>, Failure> },
    ReferenceSettingLoaded { use_reference_image: bool },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DraftStream { .. } => "draft_stream",
            Self::DraftRegenerated { .. } => "draft_regenerated",
            Self::StoryPrepared { .. } => "story_prepared",
            Self::StoryStream { .. } => "story_stream",
            Self::ScriptParsed { .. } => "script_parsed",
            Self::GenerationSettingsResolved { .. } => "generation_settings_resolved",
            Self::ReferenceGenerated { .. } => "reference_generated",
            Self::GenerationQueued { .. } => "generation_queued",
            Self::GenerationStream { .. } => "generation_stream",
            Self::StreamEnded { .. } => "stream_ended",
            Self::TitlesFetched { .. } => "titles_fetched",
            Self::ReferenceSettingLoaded { .. } => "reference_setting_loaded",
        }
    }
}

/// Input of the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    User(UserAction),
    Event(WorkflowEvent),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::User(action) => action.name(),
            Self::Event(event) => event.name(),
        }
    }
}

impl From<UserAction> for Action {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<WorkflowEvent> for Action {
    fn from(event: WorkflowEvent) -> Self {
        Self::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_action_tagged_json() {
        let action: UserAction =
            serde_json::from_str(r#"{"type": "regenerate_draft", "draft_id": 4}"#).unwrap();
        assert_eq!(action, UserAction::RegenerateDraft { draft_id: 4 });

        let action: UserAction =
            serde_json::from_str(r#"{"type": "control_generation", "action": "finish_early"}"#).unwrap();
        assert_eq!(action, UserAction::ControlGeneration { action: ControlAction::FinishEarly });

        let action: UserAction = serde_json::from_str(r#"{"type": "set_style", "style": "animation"}"#).unwrap();
        assert_eq!(action.name(), "set_style");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(serde_json::from_str::<UserAction>(r#"{"type": "launch_rockets"}"#).is_err());
    }
}
