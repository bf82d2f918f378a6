use axum::http::Method;
use serde_json::Value;

use crate::error::ServiceError;
use crate::models::{LogRequest, Outcome};
use crate::store::LogStore;
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `POST /`
    LogCommit,
    /// `GET /`
    RecentLog,
    /// `GET /leaderboard`
    Leaderboard,
}

impl Route {
    pub fn resolve(method: &Method, path: &str) -> Result<Self, ServiceError> {
        match (method, path) {
            (&Method::POST, "/") => Ok(Route::LogCommit),
            (&Method::GET, "/") => Ok(Route::RecentLog),
            (&Method::GET, "/leaderboard") => Ok(Route::Leaderboard),
            _ => Err(ServiceError::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::LogCommit => "log_commit",
            Route::RecentLog => "recent_log",
            Route::Leaderboard => "leaderboard",
        }
    }
}

/// Runs one operation against the store. `body` is only read for writes.
pub async fn dispatch(
    store: &dyn LogStore,
    route: Route,
    body: &[u8],
) -> Result<Outcome, ServiceError> {
    match route {
        Route::LogCommit => {
            let request = parse_body(body)?;
            let entry = validate::normalize(&request)?;
            let ack = store.insert(&entry).await?;
            tracing::info!(
                username = entry.username.as_str(),
                has_commit = entry.commit.is_some(),
                has_repo = entry.repo.is_some(),
                has_location = entry.location.is_some(),
                "commit logged"
            );
            Ok(Outcome::Written(ack))
        }
        Route::RecentLog => {
            let rows = store.recent().await?;
            tracing::debug!(rows = rows.len(), "recent log read");
            Ok(Outcome::Recent(rows))
        }
        Route::Leaderboard => {
            let rows = store.leaderboard().await?;
            tracing::debug!(rows = rows.len(), "leaderboard read");
            Ok(Outcome::Leaderboard(rows))
        }
    }
}

/// An empty body counts as `{}`; anything else must be a JSON object.
fn parse_body(body: &[u8]) -> Result<LogRequest, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LogRequest::default());
    }
    match serde_json::from_slice::<Value>(body)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => Err(ServiceError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
