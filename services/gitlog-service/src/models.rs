use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /`. Fields stay untyped until the validator has looked at them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogRequest {
    pub name: Value,
    pub loc: Value,
    pub commit: Value,
    pub repo: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

/// A validated entry ready to be written. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub username: String,
    pub commit: Option<String>,
    pub repo: Option<String>,
    pub location: Option<Coordinates>,
}

impl NewLogEntry {
    pub fn lon(&self) -> Option<f64> {
        self.location.map(|loc| loc.lon)
    }

    pub fn lat(&self) -> Option<f64> {
        self.location.map(|loc| loc.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub username: String,
    pub commit: Option<String>,
    pub repo: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub username: String,
    pub commit: Option<String>,
    pub repo: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub num_recent_commits: i64,
    pub most_recent_commit_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteAck {
    pub rows_affected: u64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Written(WriteAck),
    Recent(Vec<LogEntry>),
    Leaderboard(Vec<LeaderboardRow>),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
