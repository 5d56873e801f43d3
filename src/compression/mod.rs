//! # Compression Providers
//!
//! Resolves a compression format name to a decompressing input stream.
//!
//! Providers are registered by name in a [`CompressionProviderFactory`].
//! Lookups are case-insensitive. The default factory knows:
//!
//! | **Name** | **Feature** | **Behavior**                                   |
//! |----------|-------------|------------------------------------------------|
//! | None     | always      | raw stream, no decompression                   |
//! | Zip      | zip         | first file entry of a ZIP archive              |
//! | GZip     | gzip        | gzip stream (concatenated members supported)   |
//!
//! Every decompressed stream is handed out wrapped in a
//! [`BlockingReader`](blocking::BlockingReader), which guarantees full reads.
//!
//! ## Examples
//!
//! ```
//! use std::io::{Cursor, Read};
//! use xbase_batch_rs::compression::CompressionProviderFactory;
//!
//! let factory = CompressionProviderFactory::default();
//!
//! // No format: the raw stream is returned untouched
//! let mut stream = factory
//!     .open_input_stream(Box::new(Cursor::new(b"raw".to_vec())), None)
//!     .unwrap();
//! let mut content = String::new();
//! stream.read_to_string(&mut content).unwrap();
//! assert_eq!(content, "raw");
//!
//! // Unknown formats are rejected
//! assert!(factory
//!     .open_input_stream(Box::new(Cursor::new(Vec::new())), Some("rar"))
//!     .is_err());
//! ```

use std::{collections::BTreeMap, io::Read};

use log::debug;

use crate::BatchError;

use self::blocking::BlockingReader;

/// Full-read adapter placed in front of decompression streams.
pub mod blocking;

#[cfg(feature = "zip")]
#[cfg_attr(docsrs, doc(cfg(feature = "zip")))]
pub mod zip;

#[cfg(feature = "gzip")]
#[cfg_attr(docsrs, doc(cfg(feature = "gzip")))]
pub mod gzip;

/// Byte stream handed between providers and readers.
pub type InputStream = Box<dyn Read + Send>;

/// Name of the pass-through provider.
pub const NO_COMPRESSION: &str = "None";

/// A decompression algorithm that can be selected by name.
pub trait CompressionProvider: Send + Sync {
    /// Name used to select the provider (matched case-insensitively).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Wraps `input` so that reading from the result yields decompressed bytes.
    ///
    /// For archive formats this opens the first file entry.
    fn create_input_stream(&self, input: InputStream) -> Result<InputStream, BatchError>;
}

/// Pass-through provider.
pub struct NoneCompressionProvider;

impl CompressionProvider for NoneCompressionProvider {
    fn name(&self) -> &str {
        NO_COMPRESSION
    }

    fn description(&self) -> &str {
        "No compression"
    }

    fn create_input_stream(&self, input: InputStream) -> Result<InputStream, BatchError> {
        Ok(input)
    }
}

/// Registry of compression providers keyed by name.
pub struct CompressionProviderFactory {
    /// Providers keyed by lower-cased name
    providers: BTreeMap<String, Box<dyn CompressionProvider>>,
}

impl Default for CompressionProviderFactory {
    /// Creates a factory with every built-in provider enabled by the crate features.
    fn default() -> Self {
        let mut factory = Self::new();
        factory.register(Box::new(NoneCompressionProvider));

        #[cfg(feature = "zip")]
        factory.register(Box::new(zip::ZipCompressionProvider));

        #[cfg(feature = "gzip")]
        factory.register(Box::new(gzip::GzipCompressionProvider));

        factory
    }
}

impl CompressionProviderFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Registers `provider`, replacing any provider with the same name.
    pub fn register(&mut self, provider: Box<dyn CompressionProvider>) {
        let key = provider.name().to_lowercase();
        debug!("Registering compression provider: {}", provider.name());
        self.providers.insert(key, provider);
    }

    pub fn provider(&self, name: &str) -> Option<&dyn CompressionProvider> {
        self.providers
            .get(&name.to_lowercase())
            .map(|provider| provider.as_ref())
    }

    /// Names of the registered providers, sorted case-insensitively.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers
            .values()
            .map(|provider| provider.name())
            .collect()
    }

    /// Returns a stream yielding the decompressed content of `input`.
    ///
    /// - `None` or the `None` provider: `input` is returned as is.
    /// - Any other name: the provider's stream wrapped in a [`BlockingReader`].
    ///
    /// # Errors
    ///
    /// [`BatchError::Compression`] when no provider has that name or the
    /// provider cannot open the compressed content.
    pub fn open_input_stream(
        &self,
        input: InputStream,
        format: Option<&str>,
    ) -> Result<InputStream, BatchError> {
        let name = match format {
            None => return Ok(input),
            Some(name) if name.eq_ignore_ascii_case(NO_COMPRESSION) => return Ok(input),
            Some(name) => name,
        };

        let provider = self.provider(name).ok_or_else(|| {
            BatchError::Compression(format!(
                "Unknown compression format '{}', expected one of: {}",
                name,
                self.provider_names().join(", ")
            ))
        })?;

        debug!("Opening {} compressed input stream", provider.name());
        let stream = provider.create_input_stream(input)?;

        Ok(Box::new(BlockingReader::new(stream)))
    }
}
