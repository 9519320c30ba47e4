//! Workflow state snapshot and stream epoch bookkeeping

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Stage;
use crate::domain::entities::{Cut, Draft, GenerationResult, TitleSuggestion};
use crate::domain::value_objects::{ContentFormat, InputMode, RenderStyle};

/// The three kinds of streaming operations a session can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Drafts,
    Story,
    Generation,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Drafts, StreamKind::Story, StreamKind::Generation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drafts => "drafts",
            Self::Story => "story",
            Self::Generation => "generation",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one streaming operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamToken {
    pub kind: StreamKind,
    pub epoch: u64,
}

impl std::fmt::Display for StreamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.epoch)
    }
}

/// Per-kind epoch counters. Opening or closing a stream bumps its kind, so
/// events carrying an older token no longer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StreamEpochs {
    drafts: u64,
    story: u64,
    generation: u64,
}

impl StreamEpochs {
    fn slot(&mut self, kind: StreamKind) -> &mut u64 {
        match kind {
            StreamKind::Drafts => &mut self.drafts,
            StreamKind::Story => &mut self.story,
            StreamKind::Generation => &mut self.generation,
        }
    }

    pub fn current(&self, kind: StreamKind) -> StreamToken {
        let epoch = match kind {
            StreamKind::Drafts => self.drafts,
            StreamKind::Story => self.story,
            StreamKind::Generation => self.generation,
        };
        StreamToken { kind, epoch }
    }

    /// Advance `kind` to a new epoch and return its token
    pub fn bump(&mut self, kind: StreamKind) -> StreamToken {
        let slot = self.slot(kind);
        *slot += 1;
        StreamToken { kind, epoch: *slot }
    }

    pub fn is_current(&self, token: StreamToken) -> bool {
        self.current(token.kind) == token
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Message surfaced to the user (the console shows it as an alert)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Overlay text shown while the session is busy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingStatus {
    pub message: String,
    pub detail: String,
}

impl LoadingStatus {
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { message: message.into(), detail: detail.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStreamStatus {
    pub active: bool,
    /// Text received so far
    pub staged_text: String,
}

/// Everything one console session knows about its workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub stage: Stage,
    pub format: ContentFormat,
    pub style: RenderStyle,
    pub input_mode: InputMode,
    pub category: String,
    pub custom_input: String,
    /// Sorted by id ascending, ids within 1..=10
    pub drafts: Vec<Draft>,
    /// Partial text per draft id while the draft stream runs
    pub streaming_texts: BTreeMap<u32, String>,
    /// Editable copy of the draft opened in the detail view
    pub editing_draft: Option<Draft>,
    pub selected_draft: Option<Draft>,
    pub cuts: Vec<Cut>,
    pub character_prompt: String,
    pub edited_story: String,
    pub titles: Vec<TitleSuggestion>,
    pub selected_title: Option<String>,
    pub logs: Vec<String>,
    pub busy: bool,
    pub loading: Option<LoadingStatus>,
    pub story_stream: StoryStreamStatus,
    pub reference_image: Option<String>,
    pub reference_confirmed: bool,
    pub current_cut_index: u32,
    pub current_image: Option<String>,
    pub result: Option<GenerationResult>,
    pub notice: Option<Notice>,
    /// Last known value of the remote "use reference image" setting
    pub use_reference_image: bool,
    pub epochs: StreamEpochs,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            stage: Stage::ModeSelect,
            format: ContentFormat::default(),
            style: RenderStyle::default(),
            input_mode: InputMode::default(),
            category: String::new(),
            custom_input: String::new(),
            drafts: Vec::new(),
            streaming_texts: BTreeMap::new(),
            editing_draft: None,
            selected_draft: None,
            cuts: Vec::new(),
            character_prompt: String::new(),
            edited_story: String::new(),
            titles: Vec::new(),
            selected_title: None,
            logs: Vec::new(),
            busy: false,
            loading: None,
            story_stream: StoryStreamStatus::default(),
            reference_image: None,
            reference_confirmed: false,
            current_cut_index: 0,
            current_image: None,
            result: None,
            notice: None,
            use_reference_image: true,
            epochs: StreamEpochs::default(),
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topic text for the current input mode
    pub fn topic(&self) -> &str {
        match self.input_mode {
            InputMode::Category => &self.category,
            InputMode::Custom => &self.custom_input,
        }
    }

    pub fn has_topic(&self) -> bool {
        !self.topic().trim().is_empty()
    }

    /// Whether the cut list allows image generation to start
    pub fn cut_count_matches(&self) -> bool {
        match self.style {
            RenderStyle::Animation => !self.cuts.is_empty(),
            RenderStyle::Photoreal => self.cuts.len() == self.format.cut_count(),
        }
    }

    /// First 500 characters of the story, sent for title suggestions
    pub fn story_preview(&self) -> String {
        self.edited_story.chars().take(500).collect()
    }

    /// Title of the job: chosen title, else the selected draft's title
    pub fn job_title(&self) -> String {
        self.selected_title
            .clone()
            .or_else(|| self.selected_draft.as_ref().map(|d| d.title.clone()))
            .unwrap_or_default()
    }

    pub fn find_draft(&self, draft_id: u32) -> Option<&Draft> {
        self.drafts.iter().find(|d| d.id == draft_id)
    }

    pub(super) fn set_idle(&mut self) {
        self.busy = false;
        self.loading = None;
    }

    pub(super) fn set_busy(&mut self, loading: Option<LoadingStatus>) {
        self.busy = true;
        self.loading = loading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_invalidates_previous_token() {
        let mut epochs = StreamEpochs::default();
        let first = epochs.bump(StreamKind::Story);
        assert!(epochs.is_current(first));

        let second = epochs.bump(StreamKind::Story);
        assert!(!epochs.is_current(first));
        assert!(epochs.is_current(second));
        assert!(epochs.is_current(epochs.current(StreamKind::Drafts)));
    }

    #[test]
    fn test_story_preview_counts_characters() {
        let state = WorkflowState {
            edited_story: "가".repeat(600),
            ..Default::default()
        };
        assert_eq!(state.story_preview().chars().count(), 500);
    }

    #[test]
    fn test_cut_count_rule_depends_on_style() {
        let mut state = WorkflowState {
            cuts: vec![Cut::new(1, "a")],
            ..Default::default()
        };
        assert!(!state.cut_count_matches());

        state.style = RenderStyle::Animation;
        assert!(state.cut_count_matches());
    }
}
