//! Ingestion pipeline: payload → CSV → deduplicated rows in the store.
//!
//! ## What this does
//! - Tries to pull the CSV out of the payload as the hinted archive kind. If that fails
//!   for any reason, the payload is decoded as raw CSV instead, so clients may upload
//!   a bare CSV file under either tag.
//! - Decodes the CSV; a fatal decoder error is a client-input error.
//! - Applies the batch to the store (see [`apply_batch`]).
//!
//! ## Transactions & consistency
//! The existence checks, the inserts and the aggregate read all run inside one
//! **`BEGIN IMMEDIATE`** transaction via `SqliteConnection::immediate_transaction`.
//! Concurrent ingestions queue on the write lock (bounded by `busy_timeout`), so two
//! batches can never both insert the same `(id, create_date)` and the returned
//! [`IngestionStats`] always reflect exactly the post-insert state. Any failure rolls
//! the whole batch back and no stats are returned.

mod apply;

use diesel::SqliteConnection;
use thiserror::Error;

use crate::archive::{ArchiveKind, ExtractError, extract_csv};
use crate::codec::{self, DecodeError, Decoded, SkippedRow};
use crate::error::StoreError;
use crate::models::IngestionStats;

pub use apply::apply_batch;

/// Ingestion failures. No partial statistics accompany any of them.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request carried no bytes at all.
    #[error("empty request body or file")]
    EmptyPayload,

    /// The payload is neither a readable archive nor valid raw CSV.
    #[error("failed to process data: {extract}; as raw CSV: {decode}")]
    Unreadable {
        /// Why archive extraction failed.
        extract: ExtractError,
        /// Why the raw-CSV fallback failed.
        decode: DecodeError,
    },

    /// The archive was extracted but its CSV entry is unusable.
    #[error("failed to parse CSV from archive: {0}")]
    Decode(#[source] DecodeError),

    /// The store failed; the batch was rolled back.
    #[error("failed to insert data: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether the failure is caused by the client's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Store(_))
    }
}

/// Where the decoded CSV came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Extracted from an archive of the given kind.
    Archive(ArchiveKind),
    /// The payload itself, after extraction failed.
    RawCsv,
}

/// Everything an ingestion produced: the stats plus the decoder diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Store-wide statistics after the batch was committed.
    pub stats: IngestionStats,
    /// Path that produced the CSV.
    pub source: PayloadSource,
    /// Rows the decoder dropped.
    pub skipped: Vec<SkippedRow>,
    /// Data rows read from the CSV, valid or not.
    pub rows_read: usize,
}

/// Extract (or fall back to raw CSV) and decode a payload, without touching the store.
pub fn decode_payload(
    payload: &[u8],
    hint: ArchiveKind,
) -> Result<(Decoded, PayloadSource), IngestError> {
    if payload.is_empty() {
        return Err(IngestError::EmptyPayload);
    }

    match extract_csv(payload, hint) {
        Ok(csv) => {
            let decoded = codec::parse(&csv).map_err(IngestError::Decode)?;
            Ok((decoded, PayloadSource::Archive(hint)))
        }
        Err(extract) => {
            tracing::warn!(archive = %hint, error = %extract, "archive extraction failed, decoding payload as raw CSV");
            let decoded =
                codec::parse(payload).map_err(|decode| IngestError::Unreadable { extract, decode })?;
            Ok((decoded, PayloadSource::RawCsv))
        }
    }
}

/// Ingest a payload and return the store-wide statistics.
pub fn ingest(
    conn: &mut SqliteConnection,
    payload: &[u8],
    hint: ArchiveKind,
) -> Result<IngestionStats, IngestError> {
    ingest_with_report(conn, payload, hint).map(|report| report.stats)
}

/// Ingest a payload and return the statistics together with the decoder diagnostics.
pub fn ingest_with_report(
    conn: &mut SqliteConnection,
    payload: &[u8],
    hint: ArchiveKind,
) -> Result<IngestReport, IngestError> {
    let (decoded, source) = decode_payload(payload, hint)?;

    for row in &decoded.skipped {
        tracing::debug!(line = row.line, reason = %row.reason, value = %row.value, "skipping row");
    }

    let stats = apply_batch(conn, &decoded.records)?;

    tracing::info!(
        source = ?source,
        rows_read = decoded.rows_read,
        skipped = decoded.skipped_count(),
        inserted = stats.total_items,
        duplicates = stats.duplicates_count,
        total_count = stats.total_count,
        "ingested price batch"
    );

    Ok(IngestReport {
        stats,
        source,
        skipped: decoded.skipped,
        rows_read: decoded.rows_read,
    })
}
