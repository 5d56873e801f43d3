//! # Zip Compression Provider
//!
//! Reads the first file entry of a ZIP archive. Directory entries are
//! skipped; any further file entries are ignored.
//!
//! `ZipArchive` needs a seekable source, so the archive is buffered in memory
//! before its first entry is inflated.
//!
//! ## Examples
//!
//! ```rust
//! use std::io::{Cursor, Read, Write};
//! use xbase_batch_rs::compression::CompressionProviderFactory;
//! use zip::{write::SimpleFileOptions, ZipWriter};
//!
//! let mut archive = Vec::new();
//! {
//!     let mut writer = ZipWriter::new(Cursor::new(&mut archive));
//!     writer.start_file("data.dbf", SimpleFileOptions::default()).unwrap();
//!     writer.write_all(b"payload").unwrap();
//!     writer.finish().unwrap();
//! }
//!
//! let factory = CompressionProviderFactory::default();
//! let mut stream = factory
//!     .open_input_stream(Box::new(Cursor::new(archive)), Some("zip"))
//!     .unwrap();
//!
//! let mut content = Vec::new();
//! stream.read_to_end(&mut content).unwrap();
//! assert_eq!(content, b"payload");
//! ```

use std::io::{Cursor, Read};

use log::{debug, warn};
use zip::ZipArchive;

use crate::BatchError;

use super::{CompressionProvider, InputStream};

/// Provider for the `Zip` compression format.
pub struct ZipCompressionProvider;

impl CompressionProvider for ZipCompressionProvider {
    fn name(&self) -> &str {
        "Zip"
    }

    fn description(&self) -> &str {
        "ZIP compression"
    }

    /// Opens the first file entry of the archive read from `input`.
    ///
    /// # Errors
    /// - [`BatchError::Io`] if the archive cannot be read
    /// - [`BatchError::Compression`] if it is not a ZIP archive or has no file entry
    fn create_input_stream(&self, mut input: InputStream) -> Result<InputStream, BatchError> {
        let mut archive_bytes = Vec::new();
        input.read_to_end(&mut archive_bytes).map_err(BatchError::Io)?;

        let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
            .map_err(|e| BatchError::Compression(format!("Cannot open ZIP archive: {}", e)))?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                BatchError::Compression(format!("Cannot open ZIP entry #{}: {}", index, e))
            })?;

            if entry.is_dir() {
                debug!("Skipping ZIP directory entry: {}", entry.name());
                continue;
            }

            debug!("Reading ZIP entry: {}", entry.name());

            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(BatchError::Io)?;
            debug!("Inflated {} bytes from ZIP entry", content.len());

            return Ok(Box::new(Cursor::new(content)));
        }

        warn!("ZIP archive has no file entry");
        Err(BatchError::Compression(
            "ZIP archive contains no file entry".to_string(),
        ))
    }
}
