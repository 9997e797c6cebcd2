//! File tree API endpoints
//!
//! GET    /api/projects/:project_id/files - List a project's files
//! POST   /api/projects/:project_id/files - Create a file or directory
//! GET    /api/files/:id                  - Get a file
//! PUT    /api/files/:id                  - Rename or rewrite a file
//! DELETE /api/files/:id                  - Delete a file

use axum::{
    extract::{Extension, Path},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use nextmonth_store::{FileNode, NewFile, UpdateFile, WorkspaceStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use super::error::{ApiError, ApiResult, ErrorBody};
use super::SuccessResponse;

/// File view for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub content: Option<String>,
    pub is_directory: bool,
    pub parent_id: Option<i64>,
    pub project_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileNode> for FileView {
    fn from(f: FileNode) -> Self {
        Self {
            id: f.id,
            name: f.name,
            path: f.path,
            content: f.content,
            is_directory: f.is_directory,
            parent_id: f.parent_id,
            project_id: f.project_id,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// Request to create a file
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub name: String,
    pub path: String,
    pub content: Option<String>,
    #[serde(default)]
    pub is_directory: bool,
    pub parent_id: Option<i64>,
}

impl CreateFileRequest {
    fn into_new_file(self, project_id: i64) -> NewFile {
        NewFile {
            project_id,
            name: self.name,
            path: self.path,
            content: if self.is_directory { None } else { self.content },
            is_directory: self.is_directory,
            parent_id: self.parent_id,
        }
    }
}

/// Request to update a file
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// List a project's files ordered by path
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/files",
    tag = "files",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Files of the project", body = Vec<FileView>),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn list_files(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<FileView>>> {
    let files = store.files_for_project(project_id).await?;
    Ok(Json(files.into_iter().map(FileView::from).collect()))
}

/// Create a file or directory
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/files",
    tag = "files",
    params(
        ("project_id" = i64, Path, description = "Project ID")
    ),
    request_body = CreateFileRequest,
    responses(
        (status = 200, description = "File created", body = FileView),
        (status = 400, description = "Invalid file", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn create_file(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(project_id): Path<i64>,
    Json(request): Json<CreateFileRequest>,
) -> ApiResult<Json<FileView>> {
    let file = store.create_file(&request.into_new_file(project_id)).await?;
    debug!(project_id, path = %file.path, "File created");
    Ok(Json(file.into()))
}

/// Get a file
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File", body = FileView),
        (status = 404, description = "File not found", body = ErrorBody)
    )
)]
pub async fn get_file(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<FileView>> {
    Ok(Json(store.get_file(id).await?.into()))
}

/// Rename a file or replace its content
#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "Updated file", body = FileView),
        (status = 404, description = "File not found", body = ErrorBody)
    )
)]
pub async fn update_file(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateFileRequest>,
) -> ApiResult<Json<FileView>> {
    let update = UpdateFile {
        name: request.name,
        content: request.content,
    };
    Ok(Json(store.update_file(id, &update).await?.into()))
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = SuccessResponse),
        (status = 404, description = "File not found", body = ErrorBody)
    )
)]
pub async fn delete_file(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    if store.delete_file(id).await? {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(ApiError::not_found("File not found"))
    }
}

/// Create file routes
pub fn files_routes() -> Router {
    Router::new()
        .route(
            "/api/projects/:project_id/files",
            get(list_files).post(create_file),
        )
        .route(
            "/api/files/:id",
            get(get_file).put(update_file).delete(delete_file),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_directory_drops_content() {
        let request: CreateFileRequest = serde_json::from_value(serde_json::json!({
            "name": "src",
            "path": "/src",
            "content": "ignored",
            "isDirectory": true
        }))
        .unwrap();

        let new_file = request.into_new_file(3);
        assert_eq!(new_file.project_id, 3);
        assert!(new_file.is_directory);
        assert!(new_file.content.is_none());
    }

    #[test]
    fn test_create_request_defaults_to_file() {
        let request: CreateFileRequest = serde_json::from_value(serde_json::json!({
            "name": "index.js",
            "path": "/index.js",
            "parentId": 4
        }))
        .unwrap();

        let new_file = request.into_new_file(1);
        assert!(!new_file.is_directory);
        assert_eq!(new_file.parent_id, Some(4));
    }
}
