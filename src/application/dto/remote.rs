//! Wire bodies of the remote generation service
//!
//! Most endpoints answer `{success, ..., error}`; `into_result` turns those
//! into typed results so callers never look at the flag.

use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::RemoteError;
use crate::domain::entities::{Cut, Draft, GeneratedCut, ProjectDetail, ProjectSummary, TitleSuggestion};
use crate::domain::value_objects::ContentFormat;
use crate::domain::workflow::{DraftQuery, GenerationJob, ParsedScript, ReferenceRequest, StoryRequest};

/// Concept preset sent with every generation job
pub const DEFAULT_CONCEPT: &str = "기본 (Default)";

fn check(success: bool, error: Option<String>, fallback: &str) -> Result<(), RemoteError> {
    if success {
        Ok(())
    } else {
        Err(RemoteError::rejected(error, fallback))
    }
}

/// Query string of the bulk draft stream
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStreamQuery<'a> {
    pub mode: &'a str,
    pub category: &'a str,
    pub custom_input: &'a str,
}

impl<'a> From<&'a DraftQuery> for DraftStreamQuery<'a> {
    fn from(query: &'a DraftQuery) -> Self {
        Self {
            mode: query.format.as_str(),
            category: &query.category,
            custom_input: &query.custom_input,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateDraftRequest<'a> {
    pub draft_id: u32,
    pub mode: &'a str,
    pub category: &'a str,
    pub custom_input: &'a str,
}

impl<'a> RegenerateDraftRequest<'a> {
    pub fn new(draft_id: u32, query: &'a DraftQuery) -> Self {
        Self {
            draft_id,
            mode: query.format.as_str(),
            category: &query.category,
            custom_input: &query.custom_input,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateDraftResponse {
    #[serde(default)]
    pub success: bool,
    pub draft: Option<Draft>,
    pub error: Option<String>,
}

impl RegenerateDraftResponse {
    pub fn into_result(self) -> Result<Draft, RemoteError> {
        match (self.success, self.draft) {
            (true, Some(draft)) => Ok(draft),
            _ => Err(RemoteError::rejected(self.error, "Failed to regenerate")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareStoryRequest<'a> {
    pub draft_id: u32,
    pub draft_title: &'a str,
    pub draft_summary: &'a str,
    pub mode: &'a str,
}

impl<'a> From<&'a StoryRequest> for PrepareStoryRequest<'a> {
    fn from(request: &'a StoryRequest) -> Self {
        Self {
            draft_id: request.draft.id,
            draft_title: &request.draft.title,
            draft_summary: &request.draft.summary,
            mode: request.format.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareStoryResponse {
    pub request_id: Option<String>,
}

impl PrepareStoryResponse {
    pub fn into_result(self) -> Result<String, RemoteError> {
        self.request_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RemoteError::Decode("missing requestId".to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseScriptRequest<'a> {
    pub script: &'a str,
    pub mode: &'a str,
}

impl<'a> ParseScriptRequest<'a> {
    pub fn new(script: &'a str, format: ContentFormat) -> Self {
        Self {
            script,
            mode: format.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseScriptResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total_cuts: u32,
    #[serde(default)]
    pub cuts: Vec<Cut>,
    #[serde(default)]
    pub character_prompt: String,
    pub error: Option<String>,
}

impl ParseScriptResponse {
    pub fn into_result(self) -> Result<ParsedScript, RemoteError> {
        check(self.success, self.error, "알 수 없는 오류")?;
        Ok(ParsedScript {
            total_cuts: self.total_cuts,
            cuts: self.cuts,
            character_prompt: self.character_prompt,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImageRequest<'a> {
    pub mode: &'a str,
    pub style: &'a str,
    pub cut: &'a Cut,
    pub character_prompt: &'a str,
}

impl<'a> From<&'a ReferenceRequest> for ReferenceImageRequest<'a> {
    fn from(request: &'a ReferenceRequest) -> Self {
        Self {
            mode: request.format.as_str(),
            style: request.style.as_str(),
            cut: &request.cut,
            character_prompt: &request.character_prompt,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImageResponse {
    #[serde(default)]
    pub success: bool,
    pub image_url: Option<String>,
    pub error: Option<String>,
}

impl ReferenceImageResponse {
    pub fn into_result(self) -> Result<String, RemoteError> {
        match (self.success, self.image_url) {
            (true, Some(url)) if !url.is_empty() => Ok(url),
            _ => Err(RemoteError::rejected(self.error, "이미지 생성 실패")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReferenceRequest {
    /// Base64 data URL
    pub image: String,
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadReferenceResponse {
    #[serde(default)]
    pub success: bool,
    pub path: Option<String>,
    pub error: Option<String>,
}

impl UploadReferenceResponse {
    pub fn into_result(self) -> Result<String, RemoteError> {
        match (self.success, self.path) {
            (true, Some(path)) if !path.is_empty() => Ok(path),
            _ => Err(RemoteError::rejected(self.error, "업로드 실패")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueGenerationRequest<'a> {
    pub mode: &'a str,
    pub style: &'a str,
    pub topic: &'a str,
    pub cuts: &'a [Cut],
    pub concept: &'a str,
    pub title: &'a str,
    pub character_prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<&'a str>,
}

impl<'a> From<&'a GenerationJob> for QueueGenerationRequest<'a> {
    fn from(job: &'a GenerationJob) -> Self {
        Self {
            mode: job.format.job_label(),
            style: job.style.as_str(),
            topic: &job.topic,
            cuts: &job.cuts,
            concept: DEFAULT_CONCEPT,
            title: &job.title,
            character_prompt: &job.character_prompt,
            reference_image: job.reference_image.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueGenerationResponse {
    #[serde(default)]
    pub success: bool,
    pub job_id: Option<String>,
    pub error: Option<String>,
}

impl QueueGenerationResponse {
    pub fn into_result(self) -> Result<String, RemoteError> {
        match (self.success, self.job_id) {
            (true, Some(job_id)) if !job_id.is_empty() => Ok(job_id),
            _ => Err(RemoteError::rejected(self.error, "작업 큐 실패")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlRequest<'a> {
    pub action: &'a str,
}

/// Body of endpoints that only report success
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
}

impl AckResponse {
    pub fn into_result(self, fallback: &str) -> Result<(), RemoteError> {
        check(self.success, self.error, fallback)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlesRequest<'a> {
    pub story_preview: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitlesResponse {
    /// Older backends omit the flag and only send `titles`
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub titles: Vec<TitleSuggestion>,
    pub error: Option<String>,
}

impl TitlesResponse {
    pub fn into_result(self) -> Result<Vec<TitleSuggestion>, RemoteError> {
        check(self.success, self.error, "제목 생성 실패")?;
        Ok(self.titles)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectListResponse {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

/// Project detail, or `{error}` when the folder is unknown
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProjectDetailResponse {
    Missing { error: String },
    Found(ProjectDetail),
}

impl ProjectDetailResponse {
    pub fn into_result(self) -> Result<ProjectDetail, RemoteError> {
        match self {
            Self::Found(detail) => Ok(detail),
            Self::Missing { error } => Err(RemoteError::Rejected(error)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameProjectRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameProjectResponse {
    #[serde(default)]
    pub success: bool,
    pub title: Option<String>,
    pub error: Option<String>,
}

impl RenameProjectResponse {
    pub fn into_result(self, requested: &str) -> Result<String, RemoteError> {
        check(self.success, self.error, "제목 수정 실패")?;
        Ok(self.title.unwrap_or_else(|| requested.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoPromptsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub updated_cuts: Vec<GeneratedCut>,
    pub error: Option<String>,
}

impl VideoPromptsResponse {
    pub fn into_result(self) -> Result<Vec<GeneratedCut>, RemoteError> {
        check(self.success, self.error, "영상 프롬프트 생성 실패")?;
        Ok(self.updated_cuts)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::RenderStyle;

    #[test]
    fn test_queue_request_uses_job_label_and_camel_case() {
        let job = GenerationJob {
            format: ContentFormat::Short,
            style: RenderStyle::Animation,
            topic: "Story".to_string(),
            cuts: vec![Cut::new(1, "a")],
            title: String::new(),
            character_prompt: "cat".to_string(),
            reference_image: Some("/outputs/ref.png".to_string()),
        };
        let json = serde_json::to_value(QueueGenerationRequest::from(&job)).unwrap();
        assert_eq!(json["mode"], "Short Form (9:16)");
        assert_eq!(json["style"], "animation");
        assert_eq!(json["concept"], DEFAULT_CONCEPT);
        assert_eq!(json["characterPrompt"], "cat");
        assert_eq!(json["referenceImage"], "/outputs/ref.png");
        assert_eq!(json["cuts"][0]["cutNumber"], 1);
    }

    #[test]
    fn test_queue_request_omits_missing_reference() {
        let job = GenerationJob {
            format: ContentFormat::Long,
            style: RenderStyle::Photoreal,
            topic: "Story".to_string(),
            cuts: Vec::new(),
            title: String::new(),
            character_prompt: String::new(),
            reference_image: None,
        };
        let json = serde_json::to_value(QueueGenerationRequest::from(&job)).unwrap();
        assert!(json.get("referenceImage").is_none());
    }

    #[test]
    fn test_rejected_bodies_become_errors() {
        let response: ReferenceImageResponse =
            serde_json::from_str(r#"{"success": false, "error": "ComfyUI offline"}"#).unwrap();
        assert_eq!(
            response.into_result(),
            Err(RemoteError::Rejected("ComfyUI offline".to_string()))
        );

        let response: QueueGenerationResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(
            response.into_result(),
            Err(RemoteError::Rejected("작업 큐 실패".to_string()))
        );
    }

    #[test]
    fn test_project_detail_error_body() {
        let response: ProjectDetailResponse =
            serde_json::from_str(r#"{"error": "Project not found"}"#).unwrap();
        assert_eq!(
            response.into_result().unwrap_err(),
            RemoteError::Rejected("Project not found".to_string())
        );

        let response: ProjectDetailResponse = serde_json::from_str(
            r#"{"title": "t", "folder_name": "f", "assets": [], "metadata": {"title": "t"}}"#,
        )
        .unwrap();
        assert_eq!(response.into_result().unwrap().folder_name, "f");
    }

    #[test]
    fn test_titles_without_flag_are_accepted() {
        let response: TitlesResponse =
            serde_json::from_str(r#"{"titles": [{"title": "a", "style": "impact"}]}"#).unwrap();
        assert_eq!(response.into_result().unwrap().len(), 1);
    }
}
