//! Generated project history API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{history_error, ApiError};
use crate::application::dto::{
    RenameProjectRequestDto, RenameProjectResponseDto, VideoPromptsResponseDto,
};
use crate::domain::entities::{ProjectDetail, ProjectSummary};
use crate::infrastructure::state::AppState;

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    state
        .history_service
        .list()
        .await
        .map(Json)
        .map_err(history_error)
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(folder): Path<String>,
) -> Result<Json<ProjectDetail>, ApiError> {
    state
        .history_service
        .detail(&folder)
        .await
        .map(Json)
        .map_err(history_error)
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(folder): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .history_service
        .delete(&folder)
        .await
        .map_err(history_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rename_project(
    State(state): State<Arc<AppState>>,
    Path(folder): Path<String>,
    Json(req): Json<RenameProjectRequestDto>,
) -> Result<Json<RenameProjectResponseDto>, ApiError> {
    let title = state
        .history_service
        .rename(&folder, &req.title)
        .await
        .map_err(history_error)?;
    Ok(Json(RenameProjectResponseDto { title }))
}

/// Fill in video prompts for cuts that lack one
pub async fn generate_video_prompts(
    State(state): State<Arc<AppState>>,
    Path(folder): Path<String>,
) -> Result<Json<VideoPromptsResponseDto>, ApiError> {
    let (updated_cuts, project) = state
        .history_service
        .generate_video_prompts(&folder)
        .await
        .map_err(history_error)?;
    Ok(Json(VideoPromptsResponseDto {
        updated_cuts,
        project,
    }))
}
