//! CSV codec for the fixed five-column price schema.
//!
//! - [`parse`] decodes uploaded CSV into [`PriceRecord`](crate::models::PriceRecord)s,
//!   skipping invalid rows and reporting them as [`SkippedRow`] diagnostics.
//! - [`to_csv`] serialises stored rows back out with the same header.

mod decode;
mod encode;

use chrono::NaiveDate;

pub use decode::{DecodeError, Decoded, SkipReason, SkippedRow, parse};
pub use encode::{EncodeError, to_csv};

/// The ordered header every price CSV carries.
pub const HEADER: [&str; 5] = ["id", "name", "category", "price", "create_date"];

/// Calendar date format used on the wire (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date; zero padding is required.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
