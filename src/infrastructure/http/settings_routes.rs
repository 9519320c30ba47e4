use axum::{extract::State, Json};
use std::sync::Arc;

use super::{settings_error, ApiError};
use crate::application::dto::ModelsResponseDto;
use crate::application::services::BackendStatus;
use crate::domain::value_objects::{RemoteSettings, SettingsUpdate};
use crate::infrastructure::state::AppState;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RemoteSettings>, ApiError> {
    state
        .settings_service
        .get()
        .await
        .map(Json)
        .map_err(settings_error)
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<RemoteSettings>, ApiError> {
    state
        .settings_service
        .update(update)
        .await
        .map(Json)
        .map_err(settings_error)
}

pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelsResponseDto>, ApiError> {
    let models = state
        .settings_service
        .models()
        .await
        .map_err(settings_error)?;
    Ok(Json(ModelsResponseDto { models }))
}

/// Whether the generation backend answers and has an API key
pub async fn backend_status(State(state): State<Arc<AppState>>) -> Json<BackendStatus> {
    Json(state.settings_service.status().await)
}
