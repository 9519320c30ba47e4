//! Remote generation service ports
//!
//! The generation service owns every AI operation, project storage and the
//! settings document. These traits are what the application needs from it;
//! the reqwest client in infrastructure implements all three.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::domain::entities::{
    ControlAction, Draft, GeneratedCut, ProjectDetail, ProjectSummary, TitleSuggestion,
};
use crate::domain::value_objects::{ContentFormat, RemoteSettings, SettingsUpdate};
use crate::domain::workflow::{
    DraftQuery, DraftStreamEvent, Failure, GenerationJob, GenerationStreamEvent, ParsedScript,
    ReferenceRequest, StoryRequest, StoryStreamEvent,
};

/// Typed events of one server-sent-event stream
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T, RemoteError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// The service answered `success: false`
    #[error("{0}")]
    Rejected(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether repeating the same idempotent request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// `success: false` bodies carry an `error` message; fall back to a fixed text
    pub fn rejected(error: Option<String>, fallback: &str) -> Self {
        Self::Rejected(
            error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )
    }
}

impl From<RemoteError> for Failure {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Rejected(message) | RemoteError::Api { message, .. } => {
                Failure::Rejected(message)
            }
            other => Failure::Transport(other.to_string()),
        }
    }
}

/// Story, image and title generation
#[async_trait]
pub trait GenerationServicePort: Send + Sync {
    /// Open the bulk draft stream (ten drafts generated in parallel)
    async fn stream_drafts(&self, query: &DraftQuery) -> Result<EventStream<DraftStreamEvent>, RemoteError>;

    async fn regenerate_draft(&self, draft_id: u32, query: &DraftQuery) -> Result<Draft, RemoteError>;

    /// Register a story request and return its handle
    async fn prepare_story(&self, request: &StoryRequest) -> Result<String, RemoteError>;

    async fn stream_story(&self, request_id: &str) -> Result<EventStream<StoryStreamEvent>, RemoteError>;

    /// Split a hand-written script into cuts
    async fn parse_script(&self, script: &str, format: ContentFormat) -> Result<ParsedScript, RemoteError>;

    /// Generate the first cut as reference image; returns its URL
    async fn generate_reference(&self, request: &ReferenceRequest) -> Result<String, RemoteError>;

    /// Upload a user image (base64 data URL); returns the stored path
    async fn upload_reference(&self, image: &str, filename: &str) -> Result<String, RemoteError>;

    /// Enqueue a full generation job; returns the job id
    async fn queue_generation(&self, job: &GenerationJob) -> Result<String, RemoteError>;

    async fn stream_generation(&self, job_id: &str) -> Result<EventStream<GenerationStreamEvent>, RemoteError>;

    async fn control(&self, action: ControlAction) -> Result<(), RemoteError>;

    async fn suggest_titles(&self, story_preview: &str) -> Result<Vec<TitleSuggestion>, RemoteError>;
}

/// Settings document of the generation service
#[async_trait]
pub trait RemoteSettingsPort: Send + Sync {
    async fn get_settings(&self) -> Result<RemoteSettings, RemoteError>;

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), RemoteError>;

    /// Checkpoint models installed in the image backend
    async fn list_models(&self) -> Result<Vec<String>, RemoteError>;
}

/// Finished projects stored by the generation service
#[async_trait]
pub trait ProjectHistoryPort: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, RemoteError>;

    async fn get_project(&self, folder: &str) -> Result<ProjectDetail, RemoteError>;

    async fn delete_project(&self, folder: &str) -> Result<(), RemoteError>;

    /// Returns the title as stored
    async fn rename_project(&self, folder: &str, title: &str) -> Result<String, RemoteError>;

    /// Fill in missing video prompts; returns the updated cuts
    async fn generate_video_prompts(&self, folder: &str) -> Result<Vec<GeneratedCut>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_conversion_keeps_rejection_message() {
        let failure: Failure = RemoteError::Rejected("no GPU".to_string()).into();
        assert_eq!(failure, Failure::Rejected("no GPU".to_string()));

        let failure: Failure = RemoteError::Connection("refused".to_string()).into();
        assert_eq!(failure, Failure::Transport("Connection failed: refused".to_string()));
    }

    #[test]
    fn test_transient_errors() {
        assert!(RemoteError::Timeout("3s".to_string()).is_transient());
        assert!(RemoteError::Api { status: 503, message: String::new() }.is_transient());
        assert!(!RemoteError::Api { status: 404, message: String::new() }.is_transient());
        assert!(!RemoteError::Rejected("x".to_string()).is_transient());
    }

    #[test]
    fn test_rejected_falls_back_on_blank_error() {
        assert_eq!(
            RemoteError::rejected(Some(" ".to_string()), "이미지 생성 실패"),
            RemoteError::Rejected("이미지 생성 실패".to_string())
        );
    }
}
