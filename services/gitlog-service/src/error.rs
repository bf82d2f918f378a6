use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Failure reported by a [`crate::store::LogStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid github username")]
    InvalidIdentifier,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("no such method-route exists: {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidIdentifier => "invalid_identifier",
            ServiceError::InvalidBody(_) => "invalid_body",
            ServiceError::RouteNotFound { .. } => "route_not_found",
            ServiceError::Store(_) => "store_error",
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InvalidBody(err.to_string())
    }
}

// Every failure is reported as a 400; `code` tells callers which kind it was.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                code: self.code(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
