use std::fmt;

use encoding::{DecoderTrap, Encoding, EncodingRef, all::ISO_8859_1, label::encoding_from_whatwg_label};

use crate::BatchError;

/// Character set used to decode text fields.
///
/// DBF files carry no reliable encoding information, so the charset is a
/// reader setting. The default is ISO-8859-1, which maps every byte to a
/// character and therefore never fails.
#[derive(Clone, Copy)]
pub struct Charset {
    encoding: EncodingRef,
}

impl Charset {
    /// Looks up a character set by its WHATWG label (`"utf-8"`, `"latin1"`, `"cp1252"`, `"ibm866"`...).
    ///
    /// # Errors
    /// [`BatchError::Configuration`] when the label is unknown.
    pub fn for_label(label: &str) -> Result<Self, BatchError> {
        encoding_from_whatwg_label(label.trim())
            .map(|encoding| Self { encoding })
            .ok_or_else(|| BatchError::Configuration(format!("Unknown character set: {}", label)))
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decodes `bytes` strictly; malformed sequences are a conversion error.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, BatchError> {
        self.encoding
            .decode(bytes, DecoderTrap::Strict)
            .map_err(|cause| {
                BatchError::Conversion(format!("cannot decode text as {}: {}", self.name(), cause))
            })
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            encoding: ISO_8859_1,
        }
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}
