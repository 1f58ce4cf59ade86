use thiserror::Error;

use super::{DATE_FORMAT, HEADER};
use crate::models::PersistedRecord;

/// Failures while serialising an export.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The CSV writer rejected a record.
    #[error("failed to create CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Writing into the in-memory buffer failed.
    #[error("I/O error while encoding: {0}")]
    Io(#[from] std::io::Error),

    /// The zip writer failed.
    #[error("failed to create ZIP: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Serialise stored rows to CSV text with the standard header.
///
/// Prices are written with exactly two decimals and dates as `YYYY-MM-DD`;
/// quoting follows standard CSV rules.
pub fn to_csv(records: &[PersistedRecord]) -> Result<Vec<u8>, EncodeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for record in records {
        let id = record.id.to_string();
        let price = format!("{:.2}", record.price);
        let date = record.create_date.format(DATE_FORMAT).to_string();
        writer.write_record([
            id.as_str(),
            record.name.as_str(),
            record.category.as_str(),
            price.as_str(),
            date.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| EncodeError::Io(e.into_error()))
}
