//! API error responses
//!
//! Every failed request answers `{ "error": "..." }` with a 4xx/5xx status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// JSON error body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// API rejection type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<nextmonth_store::Error> for ApiError {
    fn from(err: nextmonth_store::Error) -> Self {
        use nextmonth_store::Error;
        match err {
            Error::NotFound(what) => Self::not_found(format!("Not found: {what}")),
            Error::InvalidInput(reason) => Self::bad_request(reason),
            other => {
                error!("Store error: {}", other);
                Self::internal("Internal storage error")
            }
        }
    }
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let not_found = ApiError::from(nextmonth_store::Error::NotFound("project 3".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(nextmonth_store::Error::InvalidInput("bad".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let db = ApiError::from(nextmonth_store::Error::Database("locked".into()));
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(db.message, "Internal storage error");
    }
}
