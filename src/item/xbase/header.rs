use std::io::{self, ErrorKind, Read};

use chrono::NaiveDate;
use log::debug;

use crate::BatchError;

use super::field::{FieldDescriptor, FieldType};

/// Size of the fixed part of the header.
pub const HEADER_SIZE: usize = 32;

/// Size of one entry of the field table.
pub const FIELD_DESCRIPTOR_SIZE: usize = 32;

/// Byte closing the field table.
pub const HEADER_TERMINATOR: u8 = 0x0D;

/// Optional byte marking the end of the records.
pub const END_OF_FILE: u8 = 0x1A;

/// Deletion flag of a live record.
pub const RECORD_LIVE: u8 = b' ';

/// Deletion flag of a deleted record.
pub const RECORD_DELETED: u8 = b'*';

const FIELD_NAME_SIZE: usize = 11;

/// Header and field table of a DBF file.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfHeader {
    /// File type byte (`0x03` dBase III, `0x30` Visual FoxPro, ...)
    pub version: u8,
    pub last_update: Option<NaiveDate>,
    pub record_count: u32,
    /// Offset of the first record
    pub header_length: usize,
    /// Size of one record, deletion flag included
    pub record_length: usize,
    /// Raw fields in file order, unsupported types included
    pub fields: Vec<FieldDescriptor>,
}

impl DbfHeader {
    /// Reads the header and field table, leaving `reader` on the first record.
    ///
    /// The stream is never seeked: padding between the field table and the
    /// first record (such as the Visual FoxPro backlink) is read and discarded.
    ///
    /// # Errors
    /// - [`BatchError::Format`] if the header is truncated or inconsistent
    /// - [`BatchError::Io`] if the underlying stream fails
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, BatchError> {
        let mut fixed = [0u8; HEADER_SIZE];
        read_header_bytes(reader, &mut fixed, "file header")?;

        let version = fixed[0];
        let last_update = NaiveDate::from_ymd_opt(
            1900 + i32::from(fixed[1]),
            u32::from(fixed[2]),
            u32::from(fixed[3]),
        );
        let record_count = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let header_length = usize::from(u16::from_le_bytes([fixed[8], fixed[9]]));
        let record_length = usize::from(u16::from_le_bytes([fixed[10], fixed[11]]));

        if header_length < HEADER_SIZE + 1 {
            return Err(BatchError::Format(format!(
                "header length {} is smaller than the minimum of {}",
                header_length,
                HEADER_SIZE + 1
            )));
        }

        let mut fields = Vec::new();
        let mut consumed = HEADER_SIZE;

        loop {
            if consumed >= header_length {
                return Err(BatchError::Format(
                    "field table is not terminated within the header".to_string(),
                ));
            }

            let mut descriptor = [0u8; FIELD_DESCRIPTOR_SIZE];
            read_header_bytes(reader, &mut descriptor[..1], "field table")?;
            consumed += 1;

            if descriptor[0] == HEADER_TERMINATOR {
                break;
            }

            if consumed + FIELD_DESCRIPTOR_SIZE - 1 > header_length {
                return Err(BatchError::Format(format!(
                    "field descriptor #{} exceeds header length {}",
                    fields.len() + 1,
                    header_length
                )));
            }

            read_header_bytes(reader, &mut descriptor[1..], "field descriptor")?;
            consumed += FIELD_DESCRIPTOR_SIZE - 1;

            let field = parse_descriptor(&descriptor);
            debug!(
                "Field #{}: {} {} ({}, {})",
                fields.len() + 1,
                field.name,
                field.field_type,
                field.length,
                field.decimal_count
            );
            fields.push(field);
        }

        if fields.is_empty() {
            return Err(BatchError::Format("file declares no field".to_string()));
        }

        let padding = (header_length - consumed) as u64;
        if padding > 0 {
            let skipped = io::copy(&mut (&mut *reader).take(padding), &mut io::sink())?;
            if skipped < padding {
                return Err(BatchError::Format(format!(
                    "header truncated: {} of {} padding bytes present",
                    skipped, padding
                )));
            }
        }

        let declared: usize = fields.iter().map(|field| field.length).sum();
        if declared + 1 != record_length {
            return Err(BatchError::Format(format!(
                "record length {} does not match the field lengths ({} + 1 deletion flag)",
                record_length, declared
            )));
        }

        Ok(Self {
            version,
            last_update,
            record_count,
            header_length,
            record_length,
            fields,
        })
    }
}

fn read_header_bytes<R: Read + ?Sized>(
    reader: &mut R,
    buffer: &mut [u8],
    part: &str,
) -> Result<(), BatchError> {
    reader.read_exact(buffer).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            BatchError::Format(format!("truncated {}", part))
        } else {
            BatchError::Io(e)
        }
    })
}

fn parse_descriptor(raw: &[u8; FIELD_DESCRIPTOR_SIZE]) -> FieldDescriptor {
    let name_bytes = &raw[..FIELD_NAME_SIZE];
    let name_end = name_bytes
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(FIELD_NAME_SIZE);
    let name = String::from_utf8_lossy(&name_bytes[..name_end])
        .trim()
        .to_string();

    let field_type = FieldType::from(raw[11]);

    // Clipper and FoxPro store character lengths above 255 on two bytes,
    // borrowing the decimal count as the high byte.
    let (length, decimal_count) = match field_type {
        FieldType::Character => (usize::from(u16::from_le_bytes([raw[16], raw[17]])), 0),
        _ => (usize::from(raw[16]), usize::from(raw[17])),
    };

    FieldDescriptor::new(name, field_type, length, decimal_count)
}
