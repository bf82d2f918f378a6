use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{LeaderboardRow, LogEntry, NewLogEntry, WriteAck};
use crate::store::{LogStore, RECENT_WINDOW_HOURS};

/// Process-local [`LogStore`] with the same read semantics as the SQL
/// queries. Used for local runs and tests.
#[derive(Default)]
pub struct MemoryLogStore {
    rows: RwLock<Vec<LogEntry>>,
    unavailable: AtomicBool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entry with an explicit timestamp instead of the current time.
    pub async fn insert_at(&self, entry: &NewLogEntry, timestamp: DateTime<Utc>) -> i64 {
        let mut rows = self.rows.write().await;
        let id = rows.len() as i64 + 1;
        rows.push(LogEntry {
            id,
            username: entry.username.clone(),
            commit: entry.commit.clone(),
            repo: entry.repo.clone(),
            lon: entry.lon(),
            lat: entry.lat(),
            timestamp,
        });
        id
    }

    #[cfg(test)]
    pub async fn entry_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Makes every subsequent call fail, to exercise store error paths.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    async fn window(&self) -> Vec<LogEntry> {
        let cutoff = Utc::now() - Duration::hours(i64::from(RECENT_WINDOW_HOURS));
        let mut recent: Vec<LogEntry> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.timestamp > cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        recent
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, entry: &NewLogEntry) -> Result<WriteAck, StoreError> {
        self.check_available()?;
        self.insert_at(entry, Utc::now()).await;
        Ok(WriteAck { rows_affected: 1 })
    }

    async fn recent(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.check_available()?;
        Ok(self.window().await)
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.check_available()?;

        // The window is newest first, so the first row seen per user is the
        // one whose values are displayed.
        let mut by_user: HashMap<String, LeaderboardRow> = HashMap::new();
        for entry in self.window().await {
            by_user
                .entry(entry.username.clone())
                .and_modify(|row| row.num_recent_commits += 1)
                .or_insert_with(|| LeaderboardRow {
                    username: entry.username,
                    commit: entry.commit,
                    repo: entry.repo,
                    lon: entry.lon,
                    lat: entry.lat,
                    num_recent_commits: 1,
                    most_recent_commit_timestamp: entry.timestamp,
                });
        }

        let mut board: Vec<LeaderboardRow> = by_user.into_values().collect();
        board.sort_by(|a, b| {
            b.num_recent_commits
                .cmp(&a.num_recent_commits)
                .then(b.most_recent_commit_timestamp.cmp(&a.most_recent_commit_timestamp))
                .then(a.username.cmp(&b.username))
        });
        Ok(board)
    }
}
