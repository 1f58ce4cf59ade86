//! Diesel models mapping to the database schema.
//!
//! These types mirror the `prices` table defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`PriceRecord`]: one validated CSV row, insertable as-is
//! - [`PersistedRecord`]: a stored row as read back by the export query
//! - [`IngestionStats`]: the store-wide snapshot returned after a batch is applied
//!
//! The identity of a row is the tuple `(id, create_date)`; the migration backs it
//! with the table's composite primary key.

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::prices;

/// The identity tuple of a price entry: `(id, create_date)`.
pub type IdentityKey = (i64, NaiveDate);

/// A validated price row produced by the CSV decoder.
///
/// Consumed once by the ingestion pipeline; never retained.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = prices)]
pub struct PriceRecord {
    /// Externally supplied identifier (not generated by the store).
    pub id: i64,
    /// Product name, trimmed and non-empty.
    pub name: String,
    /// Product category, trimmed and non-empty.
    pub category: String,
    /// Non-negative price, normalised to two decimal places.
    pub price: f64,
    /// Calendar date of the price entry.
    pub create_date: NaiveDate,
}

impl PriceRecord {
    /// The tuple used for deduplication, both within a batch and against the store.
    pub fn identity(&self) -> IdentityKey {
        (self.id, self.create_date)
    }
}

/// A row in [`crate::schema::prices`].
///
/// Rows are never mutated in place; the export query reads them in
/// `(create_date, id)` order.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = prices, check_for_backend(diesel::sqlite::Sqlite))]
pub struct PersistedRecord {
    /// Identifier supplied at ingestion time.
    pub id: i64,
    /// Product name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// Price with two-decimal precision.
    pub price: f64,
    /// Calendar date of the price entry.
    pub create_date: NaiveDate,
}

impl PersistedRecord {
    /// The identity tuple of the stored row.
    pub fn identity(&self) -> IdentityKey {
        (self.id, self.create_date)
    }
}

impl From<PersistedRecord> for PriceRecord {
    fn from(row: PersistedRecord) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            price: row.price,
            create_date: row.create_date,
        }
    }
}

/// Aggregate snapshot taken after a batch is applied, inside the same transaction.
///
/// Serialises to the response body
/// `{total_count, duplicates_count, total_items, total_categories, total_price}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionStats {
    /// Total number of rows in the store after the batch.
    pub total_count: i64,
    /// Records of this batch folded as duplicates (intra-batch and already persisted).
    pub duplicates_count: i64,
    /// Records of this batch that were newly written.
    pub total_items: i64,
    /// Distinct categories across the whole store.
    pub total_categories: i64,
    /// Sum of all stored prices, rounded to cents.
    pub total_price: f64,
}

/// Largest price the store accepts, the ceiling of a `DECIMAL(10,2)` column.
pub const MAX_PRICE: f64 = 99_999_999.99;

/// Round a price to two decimal places, the precision the store keeps.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
