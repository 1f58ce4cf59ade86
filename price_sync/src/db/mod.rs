//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Embedded Diesel migrations and runners: [`migrate::run_sqlite`] and [`migrate::run_all`],
//!   which rejects PostgreSQL URLs since the price store is SQLite-only.
//!
//! Example:
//! ```no_run
//! use price_sync::db::{migrate, connection};
//!
//! let db_path = std::env::temp_dir().join("price_sync_example.db");
//! migrate::run_all(db_path.to_str().unwrap()).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
