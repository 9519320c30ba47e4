//! Request and response bodies of the console's own HTTP API

use serde::{Deserialize, Serialize};

use crate::domain::entities::{GeneratedCut, ProjectDetail, SavedSet, SavedSetKind, DRAFT_BATCH_SIZE};
use crate::domain::value_objects::{ContentFormat, SessionId, CATEGORIES};
use crate::domain::workflow::{Stage, WorkflowState};

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponseDto {
    pub session_id: SessionId,
    pub state: WorkflowState,
}

/// Fixed choices the shell renders: topic categories, formats and the stepper
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleOptionsDto {
    pub categories: Vec<&'static str>,
    pub drafts_per_batch: u32,
    pub formats: Vec<FormatOptionDto>,
    pub stages: Vec<StageOptionDto>,
}

impl Default for ConsoleOptionsDto {
    fn default() -> Self {
        Self {
            categories: CATEGORIES.to_vec(),
            drafts_per_batch: DRAFT_BATCH_SIZE,
            formats: [ContentFormat::Long, ContentFormat::Short]
                .into_iter()
                .map(FormatOptionDto::from)
                .collect(),
            stages: Stage::ALL
                .into_iter()
                .map(|stage| StageOptionDto {
                    stage,
                    label: stage.label(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormatOptionDto {
    pub format: ContentFormat,
    pub label: &'static str,
    pub cut_count: usize,
    pub width: u32,
    pub height: u32,
}

impl From<ContentFormat> for FormatOptionDto {
    fn from(format: ContentFormat) -> Self {
        let (width, height) = format.resolution();
        Self {
            format,
            label: format.job_label(),
            cut_count: format.cut_count(),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOptionDto {
    /// Stage index, as in session snapshots
    pub stage: Stage,
    pub label: &'static str,
}

/// Reference image picked by the user, as a base64 data URL
#[derive(Debug, Clone, Deserialize)]
pub struct AttachReferenceRequestDto {
    pub image: String,
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveSetRequestDto {
    pub kind: SavedSetKind,
    /// Defaults to a dated name when absent
    #[serde(default)]
    pub name: Option<String>,
}

/// Both saved lists for the split-view picker
#[derive(Debug, Clone, Default, Serialize)]
pub struct SavedSetListsDto {
    pub drafts: Vec<SavedSet>,
    pub stories: Vec<SavedSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedSetKindQuery {
    pub kind: SavedSetKind,
}

/// An exported browser list: either a kind or the storage key it lived under
#[derive(Debug, Clone, Deserialize)]
pub struct ImportSavedSetsRequestDto {
    pub kind: String,
    pub records: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSavedSetsResponseDto {
    pub imported: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearSavedSetsResponseDto {
    pub removed: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameProjectRequestDto {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameProjectResponseDto {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoPromptsResponseDto {
    pub updated_cuts: Vec<GeneratedCut>,
    pub project: ProjectDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponseDto {
    pub models: Vec<String>,
}
