//! HTTP client for the remote generation service
//!
//! Implements all three remote ports. Request/response calls carry a
//! client-side timeout; idempotent reads go through the retry policy.
//! Streams are opened without a timeout and end only when the service closes
//! them or the caller drops them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::retry::RetryPolicy;
use super::sse::event_stream;
use crate::application::dto::remote::{
    AckResponse, ControlRequest, DraftStreamQuery, ModelsResponse, ParseScriptRequest,
    ParseScriptResponse, PrepareStoryRequest, PrepareStoryResponse, ProjectDetailResponse,
    ProjectListResponse, QueueGenerationRequest, QueueGenerationResponse, ReferenceImageRequest,
    ReferenceImageResponse, RegenerateDraftRequest, RegenerateDraftResponse, RenameProjectRequest,
    RenameProjectResponse, TitlesRequest, TitlesResponse, UploadReferenceRequest,
    UploadReferenceResponse, VideoPromptsResponse,
};
use crate::application::dto::{decode_draft_event, decode_generation_event, decode_story_event};
use crate::application::ports::outbound::{
    EventStream, GenerationServicePort, ProjectHistoryPort, RemoteError, RemoteSettingsPort,
};
use crate::domain::entities::{ControlAction, Draft, GeneratedCut, ProjectDetail, ProjectSummary, TitleSuggestion};
use crate::domain::value_objects::{ContentFormat, RemoteSettings, SettingsUpdate};
use crate::domain::workflow::{
    DraftQuery, DraftStreamEvent, GenerationJob, GenerationStreamEvent, ParsedScript,
    ReferenceRequest, StoryRequest, StoryStreamEvent,
};
use crate::infrastructure::config::AppConfig;

const DEFAULT_SETTINGS_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Client for the remote generation service API
pub struct RemoteClient {
    client: Client,
    base_url: String,
    settings_timeout: Duration,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settings_timeout: DEFAULT_SETTINGS_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::none(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.remote_base_url)
            .with_timeouts(config.settings_timeout(), config.request_timeout())
            .with_retry(RetryPolicy::from(&config.retry))
    }

    pub fn with_timeouts(mut self, settings: Duration, request: Duration) -> Self {
        self.settings_timeout = settings;
        self.request_timeout = request;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/history/{folder}[/{action}]` with the folder percent-encoded
    fn history_url(&self, folder: &str, action: Option<&str>) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.url("/api/history"))
            .map_err(|e| RemoteError::Connection(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Connection("base URL cannot carry a path".to_string()))?
            .push(folder)
            .extend(action);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<T, RemoteError> {
        let request = match timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };
        let response = check_status(request.send().await.map_err(transport_error)?).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                RemoteError::Decode(e.to_string())
            }
        })
    }

    /// Idempotent read, retried on transient errors
    async fn get<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T, RemoteError> {
        self.retry
            .run(path, || self.send(self.client.get(self.url(path)), Some(timeout)))
            .await
    }

    async fn post<B, T>(&self, path: &str, body: &B, timeout: Option<Duration>) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.client.post(self.url(path)).json(body), timeout).await
    }

    async fn open_stream(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        let path = e.url().map(|url| url.path().to_string()).unwrap_or_default();
        RemoteError::Timeout(path)
    } else if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Connection(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(&body, status),
    })
}

/// `{error}` / `{detail}` / `{message}` bodies, else the raw text
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "detail", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .or_else(|| Some(body.trim().to_string()).filter(|text| !text.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
}

#[async_trait]
impl GenerationServicePort for RemoteClient {
    #[instrument(skip(self), fields(category = %query.category))]
    async fn stream_drafts(&self, query: &DraftQuery) -> Result<EventStream<DraftStreamEvent>, RemoteError> {
        let request = self
            .client
            .get(self.url("/api/workflow/drafts/parallel"))
            .query(&DraftStreamQuery::from(query));
        let response = self.open_stream(request).await?;
        debug!("Draft stream opened");
        Ok(event_stream(response, decode_draft_event))
    }

    #[instrument(skip(self, query))]
    async fn regenerate_draft(&self, draft_id: u32, query: &DraftQuery) -> Result<Draft, RemoteError> {
        let response: RegenerateDraftResponse = self
            .post(
                "/api/workflow/draft/regenerate",
                &RegenerateDraftRequest::new(draft_id, query),
                Some(self.request_timeout),
            )
            .await?;
        response.into_result()
    }

    #[instrument(skip(self, request), fields(draft_id = request.draft.id))]
    async fn prepare_story(&self, request: &StoryRequest) -> Result<String, RemoteError> {
        let response: PrepareStoryResponse = self
            .post(
                "/api/workflow/story/prepare",
                &PrepareStoryRequest::from(request),
                Some(self.request_timeout),
            )
            .await?;
        response.into_result()
    }

    #[instrument(skip(self))]
    async fn stream_story(&self, request_id: &str) -> Result<EventStream<StoryStreamEvent>, RemoteError> {
        let request = self
            .client
            .get(self.url("/api/workflow/story/stream"))
            .query(&[("requestId", request_id)]);
        let response = self.open_stream(request).await?;
        Ok(event_stream(response, decode_story_event))
    }

    /// Parsing runs a model call; no client timeout
    #[instrument(skip(self, script), fields(script_len = script.len()))]
    async fn parse_script(&self, script: &str, format: ContentFormat) -> Result<ParsedScript, RemoteError> {
        let response: ParseScriptResponse = self
            .post("/api/workflow/story/parse", &ParseScriptRequest::new(script, format), None)
            .await?;
        response.into_result()
    }

    #[instrument(skip(self, request))]
    async fn generate_reference(&self, request: &ReferenceRequest) -> Result<String, RemoteError> {
        let response: ReferenceImageResponse = self
            .post(
                "/api/workflow/generate-reference",
                &ReferenceImageRequest::from(request),
                None,
            )
            .await?;
        response.into_result()
    }

    #[instrument(skip(self, image))]
    async fn upload_reference(&self, image: &str, filename: &str) -> Result<String, RemoteError> {
        let body = UploadReferenceRequest {
            image: image.to_string(),
            filename: filename.to_string(),
        };
        let response: UploadReferenceResponse = self
            .post("/api/workflow/upload_reference", &body, Some(self.request_timeout))
            .await?;
        response.into_result()
    }

    #[instrument(skip(self, job), fields(title = %job.title, cuts = job.cuts.len()))]
    async fn queue_generation(&self, job: &GenerationJob) -> Result<String, RemoteError> {
        let response: QueueGenerationResponse = self
            .post(
                "/api/queue-generation",
                &QueueGenerationRequest::from(job),
                Some(self.request_timeout),
            )
            .await?;
        response.into_result()
    }

    #[instrument(skip(self))]
    async fn stream_generation(&self, job_id: &str) -> Result<EventStream<GenerationStreamEvent>, RemoteError> {
        let request = self.client.get(self.url("/api/stream")).query(&[("jobId", job_id)]);
        let response = self.open_stream(request).await?;
        Ok(event_stream(response, decode_generation_event))
    }

    #[instrument(skip(self))]
    async fn control(&self, action: ControlAction) -> Result<(), RemoteError> {
        let response: AckResponse = self
            .post(
                "/api/workflow/control",
                &ControlRequest {
                    action: action.as_str(),
                },
                Some(self.request_timeout),
            )
            .await?;
        response.into_result("제어 요청 실패")
    }

    #[instrument(skip(self, story_preview))]
    async fn suggest_titles(&self, story_preview: &str) -> Result<Vec<TitleSuggestion>, RemoteError> {
        let response: TitlesResponse = self
            .post(
                "/api/workflow/titles",
                &TitlesRequest { story_preview },
                Some(self.request_timeout),
            )
            .await?;
        response.into_result()
    }
}

#[async_trait]
impl RemoteSettingsPort for RemoteClient {
    #[instrument(skip(self))]
    async fn get_settings(&self) -> Result<RemoteSettings, RemoteError> {
        // A settings file the service cannot read comes back as `{error}` with 200
        let value: serde_json::Value = self.get("/api/settings", self.settings_timeout).await?;
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(RemoteError::Rejected(error.to_string()));
        }
        serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    #[instrument(skip(self, update))]
    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), RemoteError> {
        let request = self.client.put(self.url("/api/settings")).json(update);
        let response: AckResponse = self.send(request, Some(self.settings_timeout)).await?;
        response.into_result("설정 저장 실패")
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<String>, RemoteError> {
        let response: ModelsResponse = self.get("/api/settings/models", self.request_timeout).await?;
        Ok(response.models)
    }
}

#[async_trait]
impl ProjectHistoryPort for RemoteClient {
    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, RemoteError> {
        let response: ProjectListResponse = self.get("/api/history", self.request_timeout).await?;
        Ok(response.projects)
    }

    #[instrument(skip(self))]
    async fn get_project(&self, folder: &str) -> Result<ProjectDetail, RemoteError> {
        let url = self.history_url(folder, None)?;
        let response: ProjectDetailResponse = self
            .retry
            .run("/api/history/{folder}", || {
                self.send(self.client.get(url.clone()), Some(self.request_timeout))
            })
            .await?;
        response.into_result()
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, folder: &str) -> Result<(), RemoteError> {
        let url = self.history_url(folder, None)?;
        let response: AckResponse = self
            .send(self.client.delete(url), Some(self.request_timeout))
            .await?;
        response.into_result("삭제 실패")
    }

    #[instrument(skip(self))]
    async fn rename_project(&self, folder: &str, title: &str) -> Result<String, RemoteError> {
        let url = self.history_url(folder, Some("title"))?;
        let response: RenameProjectResponse = self
            .send(
                self.client.post(url).json(&RenameProjectRequest { title }),
                Some(self.request_timeout),
            )
            .await?;
        response.into_result(title)
    }

    /// One model call per cut; no client timeout
    #[instrument(skip(self))]
    async fn generate_video_prompts(&self, folder: &str) -> Result<Vec<GeneratedCut>, RemoteError> {
        let url = self.history_url(folder, Some("generate_veo_prompts"))?;
        let response: VideoPromptsResponse = self.send(self.client.post(url), None).await?;
        response.into_result()
    }
}
