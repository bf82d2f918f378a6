use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::{Client, Config, NoTls, Row};

use crate::error::StoreError;
use crate::models::{LeaderboardRow, LogEntry, NewLogEntry, WriteAck};
use crate::store::{LogStore, RECENT_WINDOW_HOURS};

// Statement text is fixed; every user-supplied value travels as a bind parameter.
const SQL_INSERT_ENTRY: &str = "INSERT INTO git_log (username, \"commit\", repo, lon, lat) \
VALUES ($1, $2, $3, $4, $5)";
const SQL_SELECT_RECENT: &str = "SELECT id, username, \"commit\", repo, lon, lat, created_at \
FROM git_log \
WHERE created_at > NOW() - make_interval(hours => $1) \
ORDER BY created_at DESC, id DESC";
const SQL_SELECT_LEADERBOARD: &str = "SELECT username, \"commit\", repo, lon, lat, \
num_recent_commits, most_recent_commit_timestamp \
FROM ( \
SELECT username, \"commit\", repo, lon, lat, \
COUNT(*) OVER (PARTITION BY username) AS num_recent_commits, \
MAX(created_at) OVER (PARTITION BY username) AS most_recent_commit_timestamp, \
ROW_NUMBER() OVER (PARTITION BY username ORDER BY created_at DESC, id DESC) AS recency_rank \
FROM git_log \
WHERE created_at > NOW() - make_interval(hours => $1) \
) ranked \
WHERE recency_rank = 1 \
ORDER BY num_recent_commits DESC, most_recent_commit_timestamp DESC, username ASC";

#[derive(Clone)]
pub struct PgLogStore {
    client: Arc<Client>,
}

impl PgLogStore {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let (client, connection) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            // Drive the connection in the background.
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "database connection error");
            }
        });
        Ok(Self::new(client))
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn insert(&self, entry: &NewLogEntry) -> Result<WriteAck, StoreError> {
        let rows_affected = self
            .client
            .execute(
                SQL_INSERT_ENTRY,
                &[
                    &entry.username,
                    &entry.commit,
                    &entry.repo,
                    &entry.lon(),
                    &entry.lat(),
                ],
            )
            .await?;
        Ok(WriteAck { rows_affected })
    }

    async fn recent(&self) -> Result<Vec<LogEntry>, StoreError> {
        let rows = self
            .client
            .query(SQL_SELECT_RECENT, &[&RECENT_WINDOW_HOURS])
            .await?;
        Ok(rows.iter().map(log_entry_from_row).collect())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, StoreError> {
        let rows = self
            .client
            .query(SQL_SELECT_LEADERBOARD, &[&RECENT_WINDOW_HOURS])
            .await?;
        Ok(rows.iter().map(leaderboard_row_from_row).collect())
    }
}

fn log_entry_from_row(row: &Row) -> LogEntry {
    LogEntry {
        id: row.get("id"),
        username: row.get("username"),
        commit: row.get("commit"),
        repo: row.get("repo"),
        lon: row.get("lon"),
        lat: row.get("lat"),
        timestamp: row.get("created_at"),
    }
}

fn leaderboard_row_from_row(row: &Row) -> LeaderboardRow {
    LeaderboardRow {
        username: row.get("username"),
        commit: row.get("commit"),
        repo: row.get("repo"),
        lon: row.get("lon"),
        lat: row.get("lat"),
        num_recent_commits: row.get("num_recent_commits"),
        most_recent_commit_timestamp: row.get("most_recent_commit_timestamp"),
    }
}
