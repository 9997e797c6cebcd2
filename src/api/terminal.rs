//! Terminal session API endpoints
//!
//! POST   /api/terminal/session             - Issue a session token for a project
//! GET    /api/terminal/sessions            - List live sessions
//! DELETE /api/terminal/session/:session_id - Kill a session
//!
//! The shell itself is only spawned once a transport attaches on `/ws`.

use axum::{
    extract::{Extension, Path},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use nextmonth_core::{ProjectId, SessionId, SessionRegistry, SessionSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use super::error::{ApiError, ApiResult, ErrorBody};
use super::SuccessResponse;

/// Request to open a terminal session
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub project_id: Option<ProjectId>,
}

/// Issued session token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Live session view
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub project_id: ProjectId,
    pub attached: bool,
    pub pid: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub attached_at: Option<DateTime<Utc>>,
}

impl From<SessionSummary> for SessionView {
    fn from(s: SessionSummary) -> Self {
        Self {
            session_id: s.session_id.to_string(),
            project_id: s.project_id,
            attached: s.attached,
            pid: s.pid,
            created_at: s.created_at,
            attached_at: s.attached_at,
        }
    }
}

/// Issue a new terminal session token
#[utoipa::path(
    post,
    path = "/api/terminal/session",
    tag = "terminal",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session token issued", body = CreateSessionResponse),
        (status = 400, description = "Missing projectId", body = ErrorBody)
    )
)]
pub async fn create_session(
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let project_id = request
        .project_id
        .ok_or_else(|| ApiError::bad_request("projectId is required"))?;

    let session_id = registry.create(project_id).await;
    info!(session_id = %session_id, project_id, "Terminal session issued");

    Ok(Json(CreateSessionResponse {
        session_id: session_id.to_string(),
    }))
}

/// List live terminal sessions
#[utoipa::path(
    get,
    path = "/api/terminal/sessions",
    tag = "terminal",
    responses(
        (status = 200, description = "Live sessions, oldest first", body = Vec<SessionView>)
    )
)]
pub async fn list_sessions(
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Json<Vec<SessionView>> {
    let sessions = registry.list().await;
    Json(sessions.into_iter().map(SessionView::from).collect())
}

/// Kill a terminal session
#[utoipa::path(
    delete,
    path = "/api/terminal/session/{session_id}",
    tag = "terminal",
    params(
        ("session_id" = String, Path, description = "Session token")
    ),
    responses(
        (status = 200, description = "Session removed", body = SuccessResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn delete_session(
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let session_id = SessionId::from(session_id);
    if registry.remove(&session_id).await {
        info!(session_id = %session_id, "Terminal session killed");
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(ApiError::not_found("Session not found"))
    }
}

/// Create terminal session routes
pub fn terminal_routes() -> Router {
    Router::new()
        .route("/api/terminal/session", post(create_session))
        .route("/api/terminal/sessions", get(list_sessions))
        .route("/api/terminal/session/:session_id", delete(delete_session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use nextmonth_core::{NoopAuditStore, RegistryConfig, ShellConfig, ShellLauncher};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<SessionRegistry>) {
        let launcher = ShellLauncher::new(ShellConfig {
            program: "sh".to_string(),
            ..Default::default()
        });
        let config = RegistryConfig {
            cwd: std::env::temp_dir(),
            env: Vec::new(),
        };
        let registry = Arc::new(SessionRegistry::new(
            launcher,
            config,
            Arc::new(NoopAuditStore),
        ));
        let app = terminal_routes().layer(Extension(registry.clone()));
        (app, registry)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_session_issues_token() {
        let (app, registry) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/terminal/session",
                serde_json::json!({ "projectId": 42 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let token = body["sessionId"].as_str().unwrap();
        assert_eq!(token.len(), 32);
        assert!(registry.contains(&SessionId::from(token)).await);
    }

    #[tokio::test]
    async fn test_create_session_requires_project() {
        let (app, registry) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/terminal/session",
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "projectId is required");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (app, registry) = test_app();
        let session_id = registry.create(1).await;

        let uri = format!("/api/terminal/session/{session_id}");
        let response = app
            .clone()
            .oneshot(Request::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        let response = app
            .oneshot(Request::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let (app, registry) = test_app();
        registry.create(7).await;

        let response = app
            .oneshot(
                Request::get("/api/terminal/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["projectId"], 7);
        assert_eq!(body[0]["attached"], false);
    }
}
