//! Web API module for NextMonth
//!
//! Provides REST API endpoints for:
//! - Projects and their file trees
//! - Terminal session issuing
//! - Health checks and the OpenAPI document

pub mod docs;
pub mod error;
pub mod files;
pub mod health;
pub mod projects;
pub mod terminal;

use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use docs::docs_routes;
pub use error::{ApiError, ApiResult};
pub use files::files_routes;
pub use health::health_routes;
pub use projects::projects_routes;
pub use terminal::terminal_routes;

/// Body of successful deletes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(projects_routes())
        .merge(files_routes())
        .merge(terminal_routes())
}
