use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Header or field table cannot be parsed.
    #[error("Invalid DBF format: {0}")]
    Format(String),

    /// Raw bytes of a field cannot be converted to its value type.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A record failed while decoding the field at `index` (1-based, raw field order).
    #[error("Error reading field #{index} ({name}): {source}")]
    Field {
        index: usize,
        name: String,
        #[source]
        source: Box<BatchError>,
    },

    /// An error reported against the file it happened in.
    #[error("Error processing file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: Box<BatchError>,
    },

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl BatchError {
    /// Wraps `source` with the 1-based raw field index and field name.
    pub fn field(index: usize, name: &str, source: BatchError) -> Self {
        BatchError::Field {
            index,
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    /// Wraps `source` with the path of the file being processed.
    pub fn file(path: impl Into<String>, source: BatchError) -> Self {
        BatchError::File {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
