//! Price ingestion and export over a SQLite store.
//!
//! Inbound, a payload (zip, tar, gzip-compressed tar, or bare CSV) goes through
//! [`archive`] → [`codec`] → [`ingest`], which deduplicates on `(id, create_date)`
//! and writes new rows in one transaction. Outbound, [`export`] filters the store
//! and hands the rows to [`codec::to_csv`] and [`archive::to_archive`].

#![deny(missing_docs)]

pub mod archive;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
#[allow(missing_docs)]
pub mod schema;
