//! Export query: filter the store and re-serialise the matches as zipped CSV.
//!
//! All filters are optional and AND-combined. Price bounds of zero or less are
//! treated as absent, since a real price constraint is always positive. Results
//! come back ordered by `(create_date, id)` regardless of storage order.

use chrono::NaiveDate;
use diesel::prelude::*;
use thiserror::Error;

use crate::archive::to_archive;
use crate::codec::{EncodeError, parse_iso_date, to_csv};
use crate::error::{StoreError, StoreResult};
use crate::models::PersistedRecord;
use crate::schema::prices;

/// Rejected filter parameters.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// A `start`/`end` bound is not `YYYY-MM-DD`.
    #[error("Invalid {param} date format. Use YYYY-MM-DD (got {value:?})")]
    InvalidDate {
        /// Parameter name.
        param: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A `min`/`max` bound is not a non-negative number.
    #[error("Invalid {param} parameter (got {value:?})")]
    InvalidPrice {
        /// Parameter name.
        param: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Querying the store failed.
    #[error("Failed to get data: {0}")]
    Store(#[from] StoreError),

    /// Building the CSV or the zip failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Range/threshold filter over the stored prices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportFilter {
    /// Inclusive lower bound on `create_date`.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on `create_date`.
    pub end: Option<NaiveDate>,
    /// Inclusive lower bound on `price`; ignored when not positive.
    pub min_price: Option<f64>,
    /// Inclusive upper bound on `price`; ignored when not positive.
    pub max_price: Option<f64>,
}

impl ExportFilter {
    /// Build a filter from raw query-string values.
    ///
    /// Missing and empty values impose no constraint. Dates must be `YYYY-MM-DD`;
    /// prices must parse as finite, non-negative numbers.
    pub fn from_params(
        start: Option<&str>,
        end: Option<&str>,
        min: Option<&str>,
        max: Option<&str>,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            start: date_param("start", start)?,
            end: date_param("end", end)?,
            min_price: price_param("min", min)?,
            max_price: price_param("max", max)?,
        })
    }

    fn price_floor(&self) -> Option<f64> {
        self.min_price.filter(|p| *p > 0.0)
    }

    fn price_ceiling(&self) -> Option<f64> {
        self.max_price.filter(|p| *p > 0.0)
    }

    /// Whether a stored row satisfies every active bound.
    pub fn matches(&self, record: &PersistedRecord) -> bool {
        self.start.is_none_or(|s| record.create_date >= s)
            && self.end.is_none_or(|e| record.create_date <= e)
            && self.price_floor().is_none_or(|m| record.price >= m)
            && self.price_ceiling().is_none_or(|m| record.price <= m)
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn date_param(param: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, FilterError> {
    non_empty(raw)
        .map(|v| {
            parse_iso_date(v).ok_or_else(|| FilterError::InvalidDate {
                param,
                value: v.to_string(),
            })
        })
        .transpose()
}

fn price_param(param: &'static str, raw: Option<&str>) -> Result<Option<f64>, FilterError> {
    non_empty(raw)
        .map(|v| match v.parse::<f64>() {
            Ok(p) if p.is_finite() && p >= 0.0 => Ok(p),
            _ => Err(FilterError::InvalidPrice {
                param,
                value: v.to_string(),
            }),
        })
        .transpose()
}

/// Load every stored row matching `filter`, ordered by `(create_date, id)`.
pub fn query(conn: &mut SqliteConnection, filter: &ExportFilter) -> StoreResult<Vec<PersistedRecord>> {
    let mut q = prices::table.into_boxed();

    if let Some(start) = filter.start {
        q = q.filter(prices::create_date.ge(start));
    }
    if let Some(end) = filter.end {
        q = q.filter(prices::create_date.le(end));
    }
    if let Some(min) = filter.price_floor() {
        q = q.filter(prices::price.ge(min));
    }
    if let Some(max) = filter.price_ceiling() {
        q = q.filter(prices::price.le(max));
    }

    q.order((prices::create_date.asc(), prices::id.asc()))
        .select(PersistedRecord::as_select())
        .load(conn)
        .map_err(StoreError::Query)
}

/// Run [`query`] and encode the result as a zip archive holding `data.csv`.
pub fn export_archive(conn: &mut SqliteConnection, filter: &ExportFilter) -> Result<Vec<u8>, ExportError> {
    let rows = query(conn, filter)?;
    let csv = to_csv(&rows)?;
    let archive = to_archive(&csv)?;

    tracing::info!(rows = rows.len(), bytes = archive.len(), "exported prices");
    Ok(archive)
}
