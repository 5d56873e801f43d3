//! # GZip Compression Provider
//!
//! Streams the content of a gzip file. Concatenated gzip members are read
//! as one continuous stream, as `gzip -d` does.

use flate2::read::MultiGzDecoder;

use crate::BatchError;

use super::{CompressionProvider, InputStream};

/// Provider for the `GZip` compression format.
pub struct GzipCompressionProvider;

impl CompressionProvider for GzipCompressionProvider {
    fn name(&self) -> &str {
        "GZip"
    }

    fn description(&self) -> &str {
        "GZIP compression"
    }

    /// Wraps `input` in a streaming gzip decoder.
    ///
    /// The gzip header is only validated on the first read, so a corrupt
    /// stream surfaces as an I/O error from the reader.
    fn create_input_stream(&self, input: InputStream) -> Result<InputStream, BatchError> {
        Ok(Box::new(MultiGzDecoder::new(input)))
    }
}
