//! XBase (dBase / FoxPro `.dbf`) support.
//!
//! # Module Architecture
//!
//! 1. **DbfReader** ([`xbase_reader`]): a decoding session over one stream. It
//!    parses the header and field table at open time, exposes the output
//!    schema, then decodes one live record per call.
//!
//! 2. **XBaseItemReader** ([`xbase_item_reader`]): an `ItemReader` over a list
//!    of files. It resolves the files ([`file_list`]), opens them through a
//!    compression provider, merges their schemas ([`row_shape`]) and hands out
//!    rows of the merged shape.
//!
//! # Field types
//!
//! | **Code** | **Field**  | **Value**                                 |
//! |----------|------------|-------------------------------------------|
//! | C        | Character  | `String`, trailing blanks removed         |
//! | M        | Memo       | `String` (memo block reference)           |
//! | N, F     | Numeric    | `Number`                                  |
//! | I        | Integer    | `Number` (4-byte little-endian)           |
//! | L        | Logical    | `Boolean`                                 |
//! | D        | Date       | `Date`                                    |
//!
//! Fields of any other type are skipped: their bytes are consumed but they
//! produce no column.
//!
//! # Examples
//!
//! ```
//! use std::io::Cursor;
//! use xbase_batch_rs::item::xbase::{value::Value, xbase_reader::DbfReader};
//!
//! # let mut bytes = vec![0x03, 124, 1, 1, 1, 0, 0, 0, 65, 0, 6, 0];
//! # bytes.resize(32, 0);
//! # let mut descriptor = [0u8; 32];
//! # descriptor[..3].copy_from_slice(b"QTY");
//! # descriptor[11] = b'N';
//! # descriptor[16] = 5;
//! # bytes.extend_from_slice(&descriptor);
//! # bytes.push(0x0D);
//! # bytes.extend_from_slice(b"   120");
//! // `bytes` holds a table with one numeric field QTY and one record
//! let mut reader = DbfReader::open(Box::new(Cursor::new(bytes))).unwrap();
//!
//! let row = reader.next_row().unwrap().unwrap();
//! assert_eq!(row, vec![Some(Value::Number(120.0))]);
//! reader.close();
//! ```
pub mod charset;
mod decode;
pub mod field;
pub mod file_list;
pub mod header;
pub mod row_shape;
pub mod value;
pub mod xbase_item_reader;
pub mod xbase_reader;

#[cfg(test)]
mod test_support;
