//! CSV decoding with per-row validation.
//!
//! Only two failures are fatal: an input with no rows at all, and a header that
//! does not match [`HEADER`]. Every other problem drops the offending row and is
//! recorded as a [`SkippedRow`], so one bad row never aborts a batch. Nothing is
//! logged here; callers decide what to do with the diagnostics.

use csv::StringRecord;
use thiserror::Error;

use super::{HEADER, parse_iso_date};
use crate::models::{MAX_PRICE, PriceRecord, round_cents};

/// Fatal decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input holds no rows, not even a header.
    #[error("empty CSV file")]
    EmptyInput,

    /// The header row does not match `id,name,category,price,create_date`.
    #[error("invalid CSV headers: expected [id, name, category, price, create_date], got {found:?}")]
    SchemaMismatch {
        /// Header cells as they appeared in the input.
        found: Vec<String>,
    },

    /// The header row itself could not be read (e.g. invalid UTF-8).
    #[error("error reading CSV: {0}")]
    Read(#[from] csv::Error),
}

/// Why a data row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The row could not be tokenised as CSV.
    #[error("malformed CSV row")]
    Malformed,
    /// Fewer than five columns.
    #[error("insufficient columns")]
    TooFewColumns,
    /// `id` is not an integer.
    #[error("invalid ID")]
    InvalidId,
    /// `name` is blank after trimming.
    #[error("empty name")]
    EmptyName,
    /// `category` is blank after trimming.
    #[error("empty category")]
    EmptyCategory,
    /// `price` is not a number between 0 and [`MAX_PRICE`].
    #[error("invalid price")]
    InvalidPrice,
    /// `create_date` is not `YYYY-MM-DD`.
    #[error("invalid date")]
    InvalidDate,
}

/// Diagnostic for one dropped row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input (the header is line 1).
    pub line: u64,
    /// First check the row failed.
    pub reason: SkipReason,
    /// The offending value, or the whole row when no single cell is to blame.
    pub value: String,
}

/// Result of a successful parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    /// Accepted records in input order.
    pub records: Vec<PriceRecord>,
    /// Rows dropped by validation, in input order.
    pub skipped: Vec<SkippedRow>,
    /// Data rows read, excluding the header.
    pub rows_read: usize,
}

impl Decoded {
    /// Number of rows dropped by validation.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parse price CSV bytes.
///
/// Rows with more than five columns are accepted; the extra cells are ignored.
pub fn parse(csv_bytes: &[u8]) -> Result<Decoded, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_bytes);
    let mut rows = reader.records();

    let header = match rows.next() {
        None => return Err(DecodeError::EmptyInput),
        Some(header) => header?,
    };
    check_header(&header)?;

    let mut out = Decoded::default();
    for (idx, row) in rows.enumerate() {
        out.rows_read += 1;
        // header is line 1
        let fallback_line = idx as u64 + 2;

        let record = match row {
            Ok(record) => record,
            Err(e) => {
                out.skipped.push(SkippedRow {
                    line: e.position().map_or(fallback_line, |p| p.line()),
                    reason: SkipReason::Malformed,
                    value: e.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map_or(fallback_line, |p| p.line());
        match parse_row(&record) {
            Ok(price) => out.records.push(price),
            Err((reason, value)) => out.skipped.push(SkippedRow {
                line,
                reason,
                value,
            }),
        }
    }

    Ok(out)
}

fn check_header(header: &StringRecord) -> Result<(), DecodeError> {
    let normalized: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            // Excel likes to prefix the first header with a BOM.
            let cell = if i == 0 {
                cell.trim_start_matches('\u{feff}')
            } else {
                cell
            };
            cell.trim().to_lowercase()
        })
        .collect();

    if normalized == HEADER {
        Ok(())
    } else {
        Err(DecodeError::SchemaMismatch {
            found: header.iter().map(str::to_string).collect(),
        })
    }
}

fn parse_row(row: &StringRecord) -> Result<PriceRecord, (SkipReason, String)> {
    if row.len() < HEADER.len() {
        let whole = row.iter().collect::<Vec<_>>().join(",");
        return Err((SkipReason::TooFewColumns, whole));
    }

    let raw_id = row[0].trim();
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| (SkipReason::InvalidId, raw_id.to_string()))?;

    let name = row[1].trim();
    if name.is_empty() {
        return Err((SkipReason::EmptyName, row[1].to_string()));
    }

    let category = row[2].trim();
    if category.is_empty() {
        return Err((SkipReason::EmptyCategory, row[2].to_string()));
    }

    let raw_price = row[3].trim();
    let price = match raw_price.parse::<f64>() {
        Ok(p) if (0.0..=MAX_PRICE).contains(&p) => round_cents(p),
        _ => return Err((SkipReason::InvalidPrice, raw_price.to_string())),
    };

    let raw_date = row[4].trim();
    let create_date =
        parse_iso_date(raw_date).ok_or_else(|| (SkipReason::InvalidDate, raw_date.to_string()))?;

    Ok(PriceRecord {
        id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        create_date,
    })
}
