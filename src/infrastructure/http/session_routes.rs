//! Console session API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{parse_id, remote_error, saved_set_error, session_error, ApiError};
use crate::application::dto::{
    AttachReferenceRequestDto, ConsoleOptionsDto, SaveSetRequestDto, SessionResponseDto,
};
use crate::application::services::{SavedSetService, WorkflowSession};
use crate::domain::entities::SavedSet;
use crate::domain::value_objects::{SavedSetId, SessionId};
use crate::domain::workflow::{UserAction, WorkflowState};
use crate::infrastructure::state::AppState;

async fn find_session(state: &AppState, id: &str) -> Result<WorkflowSession, ApiError> {
    let id: SessionId = parse_id(id, "session")?;
    state.sessions.read().await.get_session(id).map_err(session_error)
}

fn respond(session: &WorkflowSession, snapshot: &WorkflowState) -> Json<SessionResponseDto> {
    Json(SessionResponseDto {
        session_id: session.id(),
        state: snapshot.clone(),
    })
}

/// Categories, formats and stage labels the workflow offers
pub async fn console_options() -> Json<ConsoleOptionsDto> {
    Json(ConsoleOptionsDto::default())
}

/// Create a session at stage 0
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionResponseDto>) {
    let session = state.sessions.write().await.create_session();
    let snapshot = session.snapshot();
    (StatusCode::CREATED, respond(&session, &snapshot))
}

/// Current snapshot of a session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    let session = find_session(&state, &id).await?;
    let snapshot = session.snapshot();
    Ok(respond(&session, &snapshot))
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: SessionId = parse_id(&id, "session")?;
    state
        .sessions
        .write()
        .await
        .close_session(id)
        .map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Dispatch one user action; answers with the snapshot right after it
pub async fn dispatch_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(action): Json<UserAction>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    let session = find_session(&state, &id).await?;
    tracing::debug!(session_id = %session.id(), action = action.name(), "Action received");
    let snapshot = session.dispatch(action).await.map_err(session_error)?;
    Ok(respond(&session, &snapshot))
}

/// Upload a user-picked reference image and attach it to the session
pub async fn attach_reference(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AttachReferenceRequestDto>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    let session = find_session(&state, &id).await?;

    let url = state
        .generation
        .upload_reference(&req.image, &req.filename)
        .await
        .map_err(|e| remote_error(&e))?;

    let snapshot = session
        .dispatch(UserAction::AttachReferenceImage { url })
        .await
        .map_err(session_error)?;
    Ok(respond(&session, &snapshot))
}

/// Save part of the session state as a named set
pub async fn save_set(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SaveSetRequestDto>,
) -> Result<(StatusCode, Json<SavedSet>), ApiError> {
    let session = find_session(&state, &id).await?;
    let snapshot = session.snapshot();

    let set = state
        .saved_set_service
        .save_from_state(req.kind, req.name, &snapshot)
        .await
        .map_err(saved_set_error)?;
    Ok((StatusCode::CREATED, Json(set)))
}

/// Restore a saved set into the session
pub async fn load_set(
    State(state): State<Arc<AppState>>,
    Path((id, set_id)): Path<(String, String)>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    let session = find_session(&state, &id).await?;
    let set_id: SavedSetId = parse_id(&set_id, "saved set")?;

    let action = state
        .saved_set_service
        .load(set_id)
        .await
        .map_err(saved_set_error)?;
    let snapshot = session.dispatch(action).await.map_err(session_error)?;
    Ok(respond(&session, &snapshot))
}
