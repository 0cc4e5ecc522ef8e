use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use thiserror::Error;

use crate::db;

const DEFAULT_DATABASE_URL: &str = "sqlite://students.db";
const DEFAULT_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub max_connections: u32,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let addr = parse_addr(&lookup, "ADVISING_ADDR", DEFAULT_ADDR)?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            addr,
            max_connections,
        })
    }

    /// Opens the store, creating the database file if it does not exist yet.
    pub async fn connect(&self) -> Result<SqlitePool, ConfigError> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        Ok(db::connect(options, self.max_connections).await?)
    }
}

fn parse_addr(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}
