//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction as the need arises, and call
//! through to the functions without any other changes.
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod balances;
pub mod orders;
pub mod users;

/// How long a connection waits for the database write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(15);

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    if let Some(dir) = database_file(url).as_deref().and_then(Path::parent).filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    info!("🗃️ Connected to {url} with up to {max_connections} connections");
    Ok(pool)
}

/// The file behind a SQLite URL, or `None` for in-memory databases.
fn database_file(url: &str) -> Option<PathBuf> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Maps a unique-constraint violation onto `on_conflict`, passing every other error through.
pub(crate) fn map_unique_violation<E, F>(e: SqlxError, on_conflict: F) -> E
where
    E: From<SqlxError>,
    F: FnOnce() -> E,
{
    match &e {
        SqlxError::Database(db_err) if db_err.is_unique_violation() => on_conflict(),
        _ => E::from(e),
    }
}
