//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies the PRAGMAs the
//! ingestion pipeline relies on: WAL journaling, foreign_keys=ON, and a 5000ms
//! busy_timeout so a second writer waits for `BEGIN IMMEDIATE` instead of failing.
//!
//! Example:
//! ```no_run
//! use price_sync::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("price_sync_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use anyhow::Context;
use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)
        .with_context(|| format!("failed to open database {database_url}"))?;

    // busy_timeout first so the journal_mode switch also waits on a busy file
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    Ok(conn)
}
