use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BatchError;

use super::{charset::Charset, decode, value::Value};

/// Type code of a field, as stored in the DBF field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `C`: fixed-width text
    Character,
    /// `M`: reference to a block of the companion memo file
    Memo,
    /// `N`: ASCII decimal number
    Numeric,
    /// `F`: ASCII floating point number
    Float,
    /// `I`: 4-byte little-endian binary integer (FoxPro)
    Integer,
    /// `L`: single byte boolean
    Logical,
    /// `D`: `YYYYMMDD` date
    Date,
    /// Any other code. The bytes are traversed but never decoded.
    Unsupported(u8),
}

impl FieldType {
    /// Returns the on-disk type code.
    pub fn code(&self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Memo => b'M',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Integer => b'I',
            FieldType::Logical => b'L',
            FieldType::Date => b'D',
            FieldType::Unsupported(code) => *code,
        }
    }

    /// Returns the value type produced for this field, `None` when unsupported.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            FieldType::Character | FieldType::Memo => Some(ValueType::String),
            FieldType::Numeric | FieldType::Float | FieldType::Integer => Some(ValueType::Number),
            FieldType::Logical => Some(ValueType::Boolean),
            FieldType::Date => Some(ValueType::Date),
            FieldType::Unsupported(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.value_type().is_some()
    }
}

impl From<u8> for FieldType {
    fn from(code: u8) -> Self {
        match code {
            b'C' => FieldType::Character,
            b'M' => FieldType::Memo,
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'I' => FieldType::Integer,
            b'L' => FieldType::Logical,
            b'D' => FieldType::Date,
            other => FieldType::Unsupported(other),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Character => write!(f, "Character"),
            FieldType::Memo => write!(f, "Memo"),
            FieldType::Numeric => write!(f, "Numeric"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Integer => write!(f, "Integer"),
            FieldType::Logical => write!(f, "Logical"),
            FieldType::Date => write!(f, "Date"),
            FieldType::Unsupported(code) => write!(f, "Unsupported(0x{:02X})", code),
        }
    }
}

/// Type of the values handed to the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    /// Floating point number
    Number,
    /// Whole number, only produced by the generated row-number column
    Integer,
    Boolean,
    Date,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "String",
            ValueType::Number => "Number",
            ValueType::Integer => "Integer",
            ValueType::Boolean => "Boolean",
            ValueType::Date => "Date",
        };
        write!(f, "{}", name)
    }
}

/// Display length of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Length {
    /// No length semantics (booleans, dates, generated columns)
    Unspecified,
    /// Number of characters of a string column
    Chars(usize),
    /// Total width and number of decimals of a numeric column
    Precision { length: usize, decimals: usize },
}

impl Length {
    /// Returns the wider of two lengths of the same kind.
    ///
    /// Lengths of different kinds keep `self`.
    pub fn widen(self, other: Length) -> Length {
        match (self, other) {
            (Length::Chars(a), Length::Chars(b)) => Length::Chars(a.max(b)),
            (
                Length::Precision {
                    length: a,
                    decimals: da,
                },
                Length::Precision {
                    length: b,
                    decimals: db,
                },
            ) => Length::Precision {
                length: a.max(b),
                decimals: da.max(db),
            },
            (length, _) => length,
        }
    }
}

/// One column of the output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub value_type: ValueType,
    pub length: Length,
}

impl FieldMeta {
    pub fn new<S: Into<String>>(name: S, value_type: ValueType, length: Length) -> Self {
        Self {
            name: name.into(),
            value_type,
            length,
        }
    }
}

/// A raw entry of the DBF field table.
///
/// Every raw field is kept, including the ones with an unsupported type:
/// their bytes still have to be skipped when a record is traversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    /// Declared length in bytes
    pub length: usize,
    pub decimal_count: usize,
}

impl FieldDescriptor {
    pub fn new<S: Into<String>>(
        name: S,
        field_type: FieldType,
        length: usize,
        decimal_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
            decimal_count,
        }
    }

    /// Builds the output column of this field, `None` for unsupported types.
    pub fn to_meta(&self) -> Option<FieldMeta> {
        let value_type = self.field_type.value_type()?;
        let length = match value_type {
            ValueType::String => Length::Chars(self.length),
            ValueType::Number => Length::Precision {
                length: self.length,
                decimals: self.decimal_count,
            },
            ValueType::Integer | ValueType::Boolean | ValueType::Date => Length::Unspecified,
        };

        Some(FieldMeta::new(self.name.clone(), value_type, length))
    }

    /// Decodes the raw bytes of this field.
    ///
    /// `Ok(None)` means the field holds no value (blank number, unknown logical, empty date).
    ///
    /// # Errors
    /// [`BatchError::Conversion`] when the bytes do not represent a value of the field type.
    pub fn decode(&self, bytes: &[u8], charset: &Charset) -> Result<Option<Value>, BatchError> {
        match self.field_type {
            FieldType::Character => decode::character(bytes, charset).map(Some),
            FieldType::Memo => decode::memo(bytes, charset),
            FieldType::Numeric | FieldType::Float => decode::number(bytes),
            FieldType::Integer => decode::integer(bytes).map(Some),
            FieldType::Logical => decode::logical(bytes),
            FieldType::Date => decode::date(bytes),
            FieldType::Unsupported(code) => Err(BatchError::Conversion(format!(
                "field type 0x{:02X} cannot be decoded",
                code
            ))),
        }
    }
}
