//! Canned remote service for session and route tests

use async_trait::async_trait;
use futures_util::stream;

use crate::application::ports::outbound::{
    EventStream, GenerationServicePort, ProjectHistoryPort, RemoteError, RemoteSettingsPort,
};
use crate::domain::entities::{
    ControlAction, Draft, GeneratedCut, GenerationResult, ProjectDetail, ProjectSummary,
    TitleSuggestion,
};
use crate::domain::value_objects::{ContentFormat, RemoteSettings, SettingsUpdate};
use crate::domain::workflow::{
    DraftQuery, DraftStreamEvent, GenerationJob, GenerationStreamEvent, ParsedScript,
    ReferenceRequest, StoryRequest, StoryStreamEvent,
};

pub const KNOWN_PROJECT: &str = "20250103_rescue";

/// Answers drafts, uploads, settings and history; every other call fails as offline
pub struct CannedRemote;

fn offline<T>() -> Result<T, RemoteError> {
    Err(RemoteError::Connection("offline".to_string()))
}

#[async_trait]
impl GenerationServicePort for CannedRemote {
    async fn stream_drafts(&self, _: &DraftQuery) -> Result<EventStream<DraftStreamEvent>, RemoteError> {
        let mut events: Vec<Result<DraftStreamEvent, RemoteError>> = (1..=10)
            .map(|id| Ok(DraftStreamEvent::Draft(Draft::new(id, format!("초안 {}", id), "요약"))))
            .collect();
        events.push(Ok(DraftStreamEvent::Complete { total: 10 }));
        Ok(Box::pin(stream::iter(events)))
    }

    async fn regenerate_draft(&self, _: u32, _: &DraftQuery) -> Result<Draft, RemoteError> {
        offline()
    }

    async fn prepare_story(&self, _: &StoryRequest) -> Result<String, RemoteError> {
        offline()
    }

    async fn stream_story(&self, _: &str) -> Result<EventStream<StoryStreamEvent>, RemoteError> {
        offline()
    }

    async fn parse_script(&self, _: &str, _: ContentFormat) -> Result<ParsedScript, RemoteError> {
        offline()
    }

    async fn generate_reference(&self, _: &ReferenceRequest) -> Result<String, RemoteError> {
        offline()
    }

    async fn upload_reference(&self, _: &str, filename: &str) -> Result<String, RemoteError> {
        Ok(format!("uploads/{}", filename))
    }

    async fn queue_generation(&self, _: &GenerationJob) -> Result<String, RemoteError> {
        offline()
    }

    async fn stream_generation(&self, _: &str) -> Result<EventStream<GenerationStreamEvent>, RemoteError> {
        offline()
    }

    async fn control(&self, _: ControlAction) -> Result<(), RemoteError> {
        offline()
    }

    async fn suggest_titles(&self, _: &str) -> Result<Vec<TitleSuggestion>, RemoteError> {
        offline()
    }
}

#[async_trait]
impl RemoteSettingsPort for CannedRemote {
    async fn get_settings(&self) -> Result<RemoteSettings, RemoteError> {
        Ok(RemoteSettings {
            use_reference_image: false,
            ..Default::default()
        })
    }

    async fn update_settings(&self, _: &SettingsUpdate) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<String>, RemoteError> {
        Ok(vec!["sdxl.safetensors".to_string()])
    }
}

#[async_trait]
impl ProjectHistoryPort for CannedRemote {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, RemoteError> {
        Ok(vec![ProjectSummary {
            folder_name: KNOWN_PROJECT.to_string(),
            title: "구조".to_string(),
            ..Default::default()
        }])
    }

    async fn get_project(&self, folder: &str) -> Result<ProjectDetail, RemoteError> {
        if folder != KNOWN_PROJECT {
            return Err(RemoteError::Rejected("Not found".to_string()));
        }
        Ok(ProjectDetail {
            title: "구조".to_string(),
            folder_name: folder.to_string(),
            assets: Vec::new(),
            metadata: GenerationResult::default(),
        })
    }

    async fn delete_project(&self, _: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn rename_project(&self, _: &str, title: &str) -> Result<String, RemoteError> {
        Ok(title.to_string())
    }

    async fn generate_video_prompts(&self, _: &str) -> Result<Vec<GeneratedCut>, RemoteError> {
        Ok(vec![GeneratedCut::default()])
    }
}
