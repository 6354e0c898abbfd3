use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures raised by the token store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error("could not find token with id {0}")]
    NotFound(i64),

    #[error("token name must not be empty")]
    InvalidName,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures surfaced by the HTTP API. The body is always `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Conflict(String),

    #[error("could not find token with id {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal,
}

/// Response extension tagging a body produced by `ApiError`, so the
/// compatibility layer can tell error bodies from ordinary ones.
#[derive(Debug, Clone, Copy)]
pub struct ErrorBody;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(id) => ApiError::NotFound(id.to_string()),
            StoreError::InvalidName => ApiError::BadRequest(StoreError::InvalidName.to_string()),
            StoreError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        let mut response = (self.status(), body).into_response();
        response.extensions_mut().insert(ErrorBody);
        response
    }
}
