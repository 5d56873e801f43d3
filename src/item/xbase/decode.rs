//! Per-type decoding of raw field bytes.

use chrono::NaiveDate;

use crate::BatchError;

use super::{charset::Charset, value::Value};

/// Text of a field with trailing blanks and NUL padding removed.
///
/// Leading whitespace is significant and kept.
pub(super) fn text(bytes: &[u8], charset: &Charset) -> Result<String, BatchError> {
    let text = charset.decode(bytes)?;
    Ok(text
        .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string())
}

pub(super) fn character(bytes: &[u8], charset: &Charset) -> Result<Value, BatchError> {
    text(bytes, charset).map(Value::String)
}

/// Memo fields share the text decoding of character fields.
///
/// A blank memo reference means the record has no memo.
pub(super) fn memo(bytes: &[u8], charset: &Charset) -> Result<Option<Value>, BatchError> {
    let text = text(bytes, charset)?;
    if text.trim_start().is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::String(text)))
    }
}

/// ASCII view of a numeric or date field, surrounding blanks removed.
fn ascii(bytes: &[u8]) -> Result<&str, BatchError> {
    std::str::from_utf8(bytes)
        .map(|text| text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0'))
        .map_err(|_| BatchError::Conversion(format!("non ASCII bytes {:?}", bytes)))
}

pub(super) fn number(bytes: &[u8]) -> Result<Option<Value>, BatchError> {
    let text = ascii(bytes)?;

    // dBase fills fields it could not store with '?' or '*'
    if text.is_empty() || text.chars().all(|c| c == '?' || c == '*') {
        return Ok(None);
    }

    text.parse::<f64>()
        .map(|number| Some(Value::Number(number)))
        .map_err(|e| BatchError::Conversion(format!("invalid number '{}': {}", text, e)))
}

pub(super) fn integer(bytes: &[u8]) -> Result<Value, BatchError> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| {
        BatchError::Conversion(format!(
            "binary integer must be 4 bytes long, found {}",
            bytes.len()
        ))
    })?;

    Ok(Value::Number(f64::from(i32::from_le_bytes(raw))))
}

pub(super) fn logical(bytes: &[u8]) -> Result<Option<Value>, BatchError> {
    match bytes.first() {
        Some(b'Y' | b'y' | b'T' | b't') => Ok(Some(Value::Boolean(true))),
        Some(b'N' | b'n' | b'F' | b'f') => Ok(Some(Value::Boolean(false))),
        Some(b'?' | b' ' | b'\0') | None => Ok(None),
        Some(other) => Err(BatchError::Conversion(format!(
            "invalid logical value '{}'",
            char::from(*other)
        ))),
    }
}

pub(super) fn date(bytes: &[u8]) -> Result<Option<Value>, BatchError> {
    let text = ascii(bytes)?;

    if text.is_empty() || text.chars().all(|c| c == '0') {
        return Ok(None);
    }

    NaiveDate::parse_from_str(text, "%Y%m%d")
        .map(|date| Some(Value::Date(date)))
        .map_err(|e| BatchError::Conversion(format!("invalid date '{}': {}", text, e)))
}
