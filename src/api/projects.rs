//! Project API endpoints
//!
//! GET    /api/projects      - List projects of the workspace user
//! POST   /api/projects      - Create a project with its starter files
//! GET    /api/projects/:id  - Get a project
//! PATCH  /api/projects/:id  - Update a project
//! DELETE /api/projects/:id  - Delete a project and its files

use axum::{
    extract::{Extension, Path},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use nextmonth_store::{NewProject, Project, ProjectSettings, ProjectUpdate, WorkspaceStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use super::error::{ApiError, ApiResult, ErrorBody};
use super::SuccessResponse;
use crate::server::AppConfig;

/// Editor preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<bool>,
}

impl From<ProjectSettings> for SettingsView {
    fn from(s: ProjectSettings) -> Self {
        Self {
            theme: s.theme,
            tab_size: s.tab_size,
            word_wrap: s.word_wrap,
        }
    }
}

impl From<SettingsView> for ProjectSettings {
    fn from(s: SettingsView) -> Self {
        Self {
            theme: s.theme,
            tab_size: s.tab_size,
            word_wrap: s.word_wrap,
        }
    }
}

/// Project view for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub template: String,
    pub user_id: i64,
    pub settings: SettingsView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectView {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            template: p.template,
            user_id: p.user_id,
            settings: p.settings.into(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Request to create a project
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub settings: Option<SettingsView>,
}

/// Request to update a project
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub template: Option<String>,
    pub settings: Option<SettingsView>,
}

impl From<UpdateProjectRequest> for ProjectUpdate {
    fn from(r: UpdateProjectRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            template: r.template,
            settings: r.settings.map(Into::into),
        }
    }
}

/// List projects, newest first
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    responses(
        (status = 200, description = "Projects of the workspace user", body = Vec<ProjectView>),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn list_projects(
    Extension(config): Extension<Arc<AppConfig>>,
    Extension(store): Extension<Arc<WorkspaceStore>>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let projects = store.list_projects(config.projects.default_user_id).await?;
    Ok(Json(projects.into_iter().map(ProjectView::from).collect()))
}

/// Create a project and its starter files
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Project created", body = ProjectView),
        (status = 400, description = "Invalid project", body = ErrorBody)
    )
)]
pub async fn create_project(
    Extension(config): Extension<Arc<AppConfig>>,
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    let mut new_project = NewProject::new(
        request.name,
        request.template,
        config.projects.default_user_id,
    );
    new_project.description = request.description;
    new_project.settings = request.settings.map(Into::into).unwrap_or_default();

    let (project, files) = store.create_project_scaffolded(&new_project).await?;
    info!(
        project_id = project.id,
        files = files.len(),
        "Project created"
    );

    Ok(Json(project.into()))
}

/// Get a project
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project", body = ProjectView),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn get_project(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectView>> {
    Ok(Json(store.get_project(id).await?.into()))
}

/// Update a project
#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated project", body = ProjectView),
        (status = 400, description = "Invalid update", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn update_project(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    let project = store.update_project(id, &request.into()).await?;
    Ok(Json(project.into()))
}

/// Delete a project and its files
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted", body = SuccessResponse),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn delete_project(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    if store.delete_project(id).await? {
        info!(project_id = id, "Project deleted");
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(ApiError::not_found(format!("Project {id} not found")))
    }
}

/// Create project routes
pub fn projects_routes() -> Router {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/:id",
            get(get_project)
                .patch(update_project)
                .delete(delete_project),
        )
}
