use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::codec::EncodeError;

/// Name of the single entry inside an exported archive.
pub const ENTRY_NAME: &str = "data.csv";

/// Wrap CSV bytes into a single-entry zip archive holding [`ENTRY_NAME`].
pub fn to_archive(csv: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(ENTRY_NAME, options)?;
    writer.write_all(csv)?;

    Ok(writer.finish()?.into_inner())
}
