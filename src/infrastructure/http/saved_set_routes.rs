//! Saved draft/story set API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{parse_id, saved_set_error, ApiError};
use crate::application::dto::{
    ClearSavedSetsResponseDto, ImportSavedSetsRequestDto, ImportSavedSetsResponseDto,
    SavedSetKindQuery, SavedSetListsDto,
};
use crate::application::services::SavedSetService;
use crate::domain::entities::{SavedSet, SavedSetKind};
use crate::domain::value_objects::SavedSetId;
use crate::infrastructure::state::AppState;

/// Both saved lists in insertion order
pub async fn list_saved_sets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SavedSetListsDto>, ApiError> {
    state
        .saved_set_service
        .list()
        .await
        .map(Json)
        .map_err(saved_set_error)
}

pub async fn delete_saved_set(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let set_id: SavedSetId = parse_id(&set_id, "saved set")?;
    state
        .saved_set_service
        .delete(set_id)
        .await
        .map_err(saved_set_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove the set at a position of one list, as the picker shows it
pub async fn delete_saved_set_at(
    State(state): State<Arc<AppState>>,
    Path((kind, position)): Path<(String, usize)>,
) -> Result<Json<SavedSet>, ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .saved_set_service
        .delete_at(kind, position)
        .await
        .map(Json)
        .map_err(saved_set_error)
}

pub async fn clear_saved_sets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SavedSetKindQuery>,
) -> Result<Json<ClearSavedSetsResponseDto>, ApiError> {
    let removed = state
        .saved_set_service
        .clear(query.kind)
        .await
        .map_err(saved_set_error)?;
    Ok(Json(ClearSavedSetsResponseDto { removed }))
}

/// Import a list exported from the browser's local storage
pub async fn import_saved_sets(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportSavedSetsRequestDto>,
) -> Result<(StatusCode, Json<ImportSavedSetsResponseDto>), ApiError> {
    let kind = parse_kind(&req.kind)?;
    let imported = state
        .saved_set_service
        .import_legacy(kind, req.records)
        .await
        .map_err(saved_set_error)?;
    Ok((StatusCode::CREATED, Json(ImportSavedSetsResponseDto { imported })))
}

fn parse_kind(kind: &str) -> Result<SavedSetKind, ApiError> {
    kind.parse().map_err(|e: String| (StatusCode::BAD_REQUEST, e))
}
