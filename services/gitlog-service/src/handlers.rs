use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    Json,
};

use crate::error::ServiceError;
use crate::models::Outcome;
use crate::routes::{self, Route};
use crate::state::AppState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn readyz() -> StatusCode {
    StatusCode::OK
}

/// Single entry point for every non-probe request. Errors are logged here and
/// rendered as 400 responses.
pub async fn invoke(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Outcome>, ServiceError> {
    let result = match Route::resolve(&method, uri.path()) {
        Ok(route) => routes::dispatch(state.store.as_ref(), route, &body)
            .await
            .map(|outcome| (route, outcome)),
        Err(err) => Err(err),
    };

    match result {
        Ok((route, outcome)) => {
            tracing::debug!(route = route.as_str(), "request served");
            Ok(Json(outcome))
        }
        Err(err @ ServiceError::Store(_)) => {
            tracing::error!(error = %err, %method, path = uri.path(), "store call failed");
            Err(err)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                code = err.code(),
                %method,
                path = uri.path(),
                "request rejected"
            );
            Err(err)
        }
    }
}
