use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{LeaderboardRow, LogEntry, NewLogEntry, WriteAck};

/// Reads only look at entries newer than this many hours.
pub const RECENT_WINDOW_HOURS: i32 = 24;

/// The three round trips the service makes to its backing store.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Appends one entry; the store stamps it with the current time.
    async fn insert(&self, entry: &NewLogEntry) -> Result<WriteAck, StoreError>;

    /// Entries inside the recent window, newest first.
    async fn recent(&self) -> Result<Vec<LogEntry>, StoreError>;

    /// One row per username inside the recent window, ranked by commit count
    /// and then by latest commit time. Commit, repo and location come from the
    /// user's most recent entry.
    async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, StoreError>;
}
