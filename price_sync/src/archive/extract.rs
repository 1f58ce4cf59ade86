//! Locate and read the CSV entry inside an uploaded archive.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use thiserror::Error;

use super::ArchiveKind;

/// First bytes of a zip local file header (`PK`).
const ZIP_MAGIC: [u8; 2] = [0x50, 0x4B];
/// First bytes of a gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Errors raised while pulling the CSV entry out of an archive.
///
/// The ingestion pipeline treats all of these as a signal to retry the payload
/// as raw CSV; none of them is fatal on its own.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The archive tag is neither `zip` nor `tar`.
    #[error("unsupported archive type: {0} (use 'zip' or 'tar')")]
    UnsupportedFormat(String),

    /// The payload failed its signature check or is structurally corrupt.
    #[error("invalid {kind} archive: {reason}")]
    InvalidArchive {
        /// Container format that was being read.
        kind: ArchiveKind,
        /// What went wrong.
        reason: String,
    },

    /// The archive is readable but holds no entry ending in `.csv`.
    #[error("no CSV file found in {0} archive")]
    NoCsvEntry(ArchiveKind),
}

fn invalid(kind: ArchiveKind, reason: impl ToString) -> ExtractError {
    ExtractError::InvalidArchive {
        kind,
        reason: reason.to_string(),
    }
}

fn is_csv_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".csv")
}

/// Extract the first CSV entry using a textual archive tag (`"zip"` or `"tar"`).
///
/// Fails with [`ExtractError::UnsupportedFormat`] for any other tag.
pub fn extract(payload: &[u8], tag: &str) -> Result<Vec<u8>, ExtractError> {
    let kind: ArchiveKind = tag.parse()?;
    extract_csv(payload, kind)
}

/// Extract the bytes of the first `.csv` entry of `payload`, read as `kind`.
pub fn extract_csv(payload: &[u8], kind: ArchiveKind) -> Result<Vec<u8>, ExtractError> {
    match kind {
        ArchiveKind::Zip => extract_zip(payload),
        ArchiveKind::Tar => extract_tar(payload),
    }
}

fn extract_zip(payload: &[u8]) -> Result<Vec<u8>, ExtractError> {
    if payload.len() < 4 || !payload.starts_with(&ZIP_MAGIC) {
        return Err(invalid(ArchiveKind::Zip, "not a valid zip file"));
    }

    let mut archive =
        zip::ZipArchive::new(Cursor::new(payload)).map_err(|e| invalid(ArchiveKind::Zip, e))?;

    // Central directory order is the order the entries were stored in.
    for index in 0..archive.len() {
        let is_match = {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| invalid(ArchiveKind::Zip, e))?;
            !entry.is_dir() && is_csv_name(entry.name())
        };
        if !is_match {
            continue;
        }

        let mut entry = archive
            .by_index(index)
            .map_err(|e| invalid(ArchiveKind::Zip, e))?;
        // The declared size is attacker-controlled; let the read grow the buffer.
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| invalid(ArchiveKind::Zip, format!("error reading CSV from zip: {e}")))?;
        return Ok(buf);
    }

    Err(ExtractError::NoCsvEntry(ArchiveKind::Zip))
}

fn extract_tar(payload: &[u8]) -> Result<Vec<u8>, ExtractError> {
    if payload.starts_with(&GZIP_MAGIC) {
        first_csv_in_tar(GzDecoder::new(payload))
    } else {
        first_csv_in_tar(payload)
    }
}

fn first_csv_in_tar<R: Read>(reader: R) -> Result<Vec<u8>, ExtractError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| invalid(ArchiveKind::Tar, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| invalid(ArchiveKind::Tar, e))?;
        if entry.header().entry_type().is_dir() {
            continue;
        }

        let is_match = {
            let path = entry.path().map_err(|e| invalid(ArchiveKind::Tar, e))?;
            is_csv_name(&path.to_string_lossy())
        };
        if !is_match {
            continue;
        }

        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| invalid(ArchiveKind::Tar, format!("error reading CSV from tar: {e}")))?;
        return Ok(buf);
    }

    Err(ExtractError::NoCsvEntry(ArchiveKind::Tar))
}
