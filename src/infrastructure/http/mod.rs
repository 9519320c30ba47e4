//! HTTP REST API routes

mod history_routes;
mod saved_set_routes;
mod session_routes;
mod settings_routes;

use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::application::ports::outbound::{RemoteError, SavedSetError};
use crate::application::services::{HistoryError, SessionError, SettingsServiceError};
use crate::infrastructure::state::AppState;

/// Error half of every handler result
pub type ApiError = (StatusCode, String);

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Session routes
        .route("/api/options", get(session_routes::console_options))
        .route("/api/sessions", post(session_routes::create_session))
        .route("/api/sessions/{id}", get(session_routes::get_session))
        .route("/api/sessions/{id}", delete(session_routes::close_session))
        .route(
            "/api/sessions/{id}/actions",
            post(session_routes::dispatch_action),
        )
        .route(
            "/api/sessions/{id}/reference",
            post(session_routes::attach_reference),
        )
        .route(
            "/api/sessions/{id}/saved-sets",
            post(session_routes::save_set),
        )
        .route(
            "/api/sessions/{id}/saved-sets/{set_id}/load",
            post(session_routes::load_set),
        )
        // Saved set routes
        .route("/api/saved-sets", get(saved_set_routes::list_saved_sets))
        .route("/api/saved-sets", delete(saved_set_routes::clear_saved_sets))
        .route(
            "/api/saved-sets/import",
            post(saved_set_routes::import_saved_sets),
        )
        .route(
            "/api/saved-sets/{set_id}",
            delete(saved_set_routes::delete_saved_set),
        )
        .route(
            "/api/saved-sets/{kind}/positions/{index}",
            delete(saved_set_routes::delete_saved_set_at),
        )
        // History routes
        .route("/api/history", get(history_routes::list_projects))
        .route("/api/history/{folder}", get(history_routes::get_project))
        .route(
            "/api/history/{folder}",
            delete(history_routes::delete_project),
        )
        .route(
            "/api/history/{folder}/title",
            post(history_routes::rename_project),
        )
        .route(
            "/api/history/{folder}/generate_veo_prompts",
            post(history_routes::generate_video_prompts),
        )
        // Settings routes
        .route("/api/settings", get(settings_routes::get_settings))
        .route("/api/settings", put(settings_routes::update_settings))
        .route("/api/settings/models", get(settings_routes::list_models))
        .route("/api/status", get(settings_routes::backend_status))
}

/// Parse a typed id from a path segment
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid {} ID", what)))
}

pub(crate) fn session_error(e: SessionError) -> ApiError {
    let status = match e {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Closed(_) => StatusCode::GONE,
    };
    (status, e.to_string())
}

fn saved_set_error(e: SavedSetError) -> ApiError {
    let status = match e {
        SavedSetError::Validation(_) => StatusCode::BAD_REQUEST,
        SavedSetError::NotFound(_) => StatusCode::NOT_FOUND,
        SavedSetError::Database(_) | SavedSetError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

fn remote_error(e: &RemoteError) -> ApiError {
    let status = match e {
        RemoteError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RemoteError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

fn history_error(e: HistoryError) -> ApiError {
    match e {
        HistoryError::Remote(remote) => remote_error(&remote),
        other => (StatusCode::BAD_REQUEST, other.to_string()),
    }
}

fn settings_error(e: SettingsServiceError) -> ApiError {
    match e {
        busy @ SettingsServiceError::Busy => (StatusCode::CONFLICT, busy.to_string()),
        SettingsServiceError::Remote(remote) => remote_error(&remote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::persistence::SqliteSavedSetRepository;
    use crate::infrastructure::testing::{CannedRemote, KNOWN_PROJECT};

    async fn create_test_app() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let saved_sets = SqliteSavedSetRepository::new(pool).await.unwrap();
        let remote = Arc::new(CannedRemote);
        let state = AppState::with_adapters(
            AppConfig::defaults(),
            remote.clone(),
            remote.clone(),
            remote,
            Arc::new(saved_sets),
        );
        create_routes().with_state(Arc::new(state))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_session_dispatch_advances_stage() {
        let app = create_test_app().await;
        let id = create_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/actions", id),
            Some(json!({ "type": "confirm_mode" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["stage"], 1);

        let (status, body) = call(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["stage"], 1);
    }

    #[tokio::test]
    async fn test_console_options() {
        let app = create_test_app().await;
        let (status, body) = call(&app, Method::GET, "/api/options", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"].as_array().unwrap().len(), 10);
        assert_eq!(body["categories"][0], "사고·부상");
        assert_eq!(body["drafts_per_batch"], 10);
        assert_eq!(
            body["formats"][0],
            json!({ "format": "long", "label": "Long Form (16:9)", "cut_count": 100, "width": 1920, "height": 1080 })
        );
        assert_eq!(body["formats"][1]["cut_count"], 20);
        assert_eq!(body["formats"][1]["height"], 1920);
        assert_eq!(body["stages"].as_array().unwrap().len(), 5);
        assert_eq!(body["stages"][4], json!({ "stage": 4, "label": "제목 선택" }));
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_session_ids() {
        let app = create_test_app().await;
        let unknown = uuid::Uuid::new_v4();

        let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{}", unknown), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/api/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_closed_session_is_gone_from_registry() {
        let app = create_test_app().await;
        let id = create_session(&app).await;

        let (status, _) = call(&app, Method::DELETE, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_save_list_and_delete_draft_set() {
        let app = create_test_app().await;
        let id = create_session(&app).await;

        let load = json!({
            "type": "load_draft_set",
            "set": {
                "category": "모성애",
                "drafts": [{ "id": 2, "title": "b" }, { "id": 1, "title": "a" }]
            }
        });
        let (status, body) =
            call(&app, Method::POST, &format!("/api/sessions/{}/actions", id), Some(load)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["drafts"][0]["id"], 1);

        let (status, saved) = call(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/saved-sets", id),
            Some(json!({ "kind": "draft", "name": "첫 세트" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["name"], "첫 세트");

        let (status, lists) = call(&app, Method::GET, "/api/saved-sets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lists["drafts"].as_array().unwrap().len(), 1);
        assert!(lists["stories"].as_array().unwrap().is_empty());

        let (status, removed) =
            call(&app, Method::DELETE, "/api/saved-sets/draft/positions/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed["id"], saved["id"]);

        let (status, _) =
            call(&app, Method::DELETE, "/api/saved-sets/draft/positions/0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_save_rejects_blank_name() {
        let app = create_test_app().await;
        let id = create_session(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/saved-sets", id),
            Some(json!({ "kind": "story", "name": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_load_saved_story_into_session() {
        let app = create_test_app().await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/saved-sets/import",
            Some(json!({
                "kind": "akitect_stories_list",
                "records": [{
                    "title": "",
                    "savedAt": "2025-01-03T10:00:00Z",
                    "mode": "short",
                    "editedStory": "구조 이야기"
                }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["imported"], 1);

        let (_, lists) = call(&app, Method::GET, "/api/saved-sets", None).await;
        let set_id = lists["stories"][0]["id"].as_str().unwrap().to_string();

        let id = create_session(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/saved-sets/{}/load", id, set_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["stage"], 2);
        assert_eq!(body["state"]["editedStory"], "구조 이야기");
    }

    #[tokio::test]
    async fn test_import_rejects_unknown_kind() {
        let app = create_test_app().await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/saved-sets/import",
            Some(json!({ "kind": "bookmarks", "records": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reference_upload_attaches_url() {
        let app = create_test_app().await;
        let id = create_session(&app).await;
        let load = json!({ "type": "load_story_set", "story": { "mode": "short" } });
        call(&app, Method::POST, &format!("/api/sessions/{}/actions", id), Some(load)).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/reference", id),
            Some(json!({ "image": "data:image/png;base64,AAAA", "filename": "cat.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["referenceImage"], "uploads/cat.png");
    }

    #[tokio::test]
    async fn test_settings_routes() {
        let app = create_test_app().await;

        let (status, body) = call(&app, Method::GET, "/api/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["use_reference_image"], false);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/settings",
            Some(json!({ "steps": 30 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::GET, "/api/settings/models", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"][0], "sdxl.safetensors");
    }

    #[tokio::test]
    async fn test_history_routes() {
        let app = create_test_app().await;

        let (status, body) = call(&app, Method::GET, "/api/history", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["folder_name"], KNOWN_PROJECT);

        let (status, _) =
            call(&app, Method::GET, &format!("/api/history/{}", KNOWN_PROJECT), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::GET, "/api/history/missing", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&app, Method::GET, "/api/history/a%5Cb", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/history/{}/title", KNOWN_PROJECT),
            Some(json!({ "title": "  새 제목 " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "새 제목");
    }
}
