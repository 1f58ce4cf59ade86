//! Archive containers around the price CSV.
//!
//! Inbound payloads may be a zip archive, a tar archive, or a gzip-compressed
//! tar archive; [`extract_csv`] sniffs the signature bytes and returns the raw
//! bytes of the first entry whose name ends in `.csv` (case-insensitive).
//! Outbound exports are wrapped by [`to_archive`] into a single-entry zip
//! holding [`ENTRY_NAME`].
//!
//! Payloads are fully buffered in memory; nothing here streams.

mod extract;
mod pack;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use extract::{ExtractError, extract, extract_csv};
pub use pack::{ENTRY_NAME, to_archive};

/// Container format tag supplied by the client alongside the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// A zip archive (the default when the client sends no tag).
    #[default]
    Zip,
    /// A tar archive, optionally gzip-compressed.
    Tar,
}

impl ArchiveKind {
    /// The lowercase tag used on the wire and in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Tar => "tar",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveKind::Zip),
            "tar" => Ok(ArchiveKind::Tar),
            _ => Err(ExtractError::UnsupportedFormat(s.to_string())),
        }
    }
}
