use std::{env, str::FromStr};

use thiserror::Error;
use tokio_postgres::Config as PgConfig;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("DATABASE_URL is not a valid connection string: {0}")]
    DatabaseUrl(#[from] tokio_postgres::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

pub struct ServiceConfig {
    pub port: u16,
    pub backend: StoreBackend,
    /// Present whenever `backend` is `Postgres`.
    pub database: Option<PgConfig>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parsed(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let backend = parsed(&lookup, "GITLOG_STORE")?.unwrap_or(StoreBackend::Postgres);
        let database = match backend {
            StoreBackend::Postgres => Some(database_config(&lookup)?),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            port,
            backend,
            database,
        })
    }
}

/// `DATABASE_URL` wins; otherwise the connection is assembled from the
/// individual `DB_*` variables.
fn database_config(lookup: &impl Fn(&str) -> Option<String>) -> Result<PgConfig, ConfigError> {
    if let Some(url) = lookup("DATABASE_URL") {
        return Ok(url.parse::<PgConfig>()?);
    }

    let host = lookup("DB_ENDPOINT").ok_or(ConfigError::Missing("DB_ENDPOINT or DATABASE_URL"))?;
    let port = parsed(lookup, "DB_PORT")?.unwrap_or(DEFAULT_DB_PORT);

    let mut config = PgConfig::new();
    config.host(&host).port(port);
    if let Some(user) = lookup("DB_USER") {
        config.user(&user);
    }
    if let Some(password) = lookup("DB_PASSWORD") {
        config.password(password);
    }
    if let Some(dbname) = lookup("DB_DB") {
        config.dbname(&dbname);
    }
    Ok(config)
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
