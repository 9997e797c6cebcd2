//! API Documentation
//!
//! Serves the OpenAPI document at /api/openapi.json

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use super::{
    error::ErrorBody,
    files::{CreateFileRequest, FileView, UpdateFileRequest},
    projects::{CreateProjectRequest, ProjectView, SettingsView, UpdateProjectRequest},
    terminal::{CreateSessionRequest, CreateSessionResponse, SessionView},
    SuccessResponse,
};

/// NextMonth API OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "NextMonth API",
        version = "1.0.0",
        description = "Workspace server REST API.

## Overview
- **Projects**: Create and manage workspace projects
- **Files**: Read and edit a project's file tree
- **Terminal**: Issue interactive shell sessions

Terminal I/O itself runs over the `/ws` WebSocket, opened with the
`sessionId` and `projectId` query parameters.
",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Projects
        crate::api::projects::list_projects,
        crate::api::projects::create_project,
        crate::api::projects::get_project,
        crate::api::projects::update_project,
        crate::api::projects::delete_project,
        // Files
        crate::api::files::list_files,
        crate::api::files::create_file,
        crate::api::files::get_file,
        crate::api::files::update_file,
        crate::api::files::delete_file,
        // Terminal
        crate::api::terminal::create_session,
        crate::api::terminal::list_sessions,
        crate::api::terminal::delete_session,
    ),
    components(
        schemas(
            ErrorBody,
            SuccessResponse,
            // Projects
            ProjectView,
            SettingsView,
            CreateProjectRequest,
            UpdateProjectRequest,
            // Files
            FileView,
            CreateFileRequest,
            UpdateFileRequest,
            // Terminal
            CreateSessionRequest,
            CreateSessionResponse,
            SessionView,
        )
    ),
    tags(
        (name = "projects", description = "Project management"),
        (name = "files", description = "Project file tree"),
        (name = "terminal", description = "Interactive terminal sessions"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create documentation routes
pub fn docs_routes() -> Router {
    Router::new().route("/api/openapi.json", get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_terminal_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/terminal/session"));
        assert!(doc.paths.paths.contains_key("/api/files/{id}"));
        assert_eq!(doc.info.title, "NextMonth API");
    }
}
