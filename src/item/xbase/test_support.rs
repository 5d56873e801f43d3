//! In-memory DBF fixtures for unit tests.

use super::header::{END_OF_FILE, FIELD_DESCRIPTOR_SIZE, HEADER_SIZE, HEADER_TERMINATOR};

/// Raw 32-byte field descriptor.
pub(crate) fn field_descriptor(
    name: &str,
    code: u8,
    length: u8,
    decimals: u8,
) -> [u8; FIELD_DESCRIPTOR_SIZE] {
    let mut raw = [0u8; FIELD_DESCRIPTOR_SIZE];
    let name = name.as_bytes();
    raw[..name.len().min(11)].copy_from_slice(&name[..name.len().min(11)]);
    raw[11] = code;
    raw[16] = length;
    raw[17] = decimals;
    raw
}

pub(crate) struct DbfBuilder {
    version: u8,
    descriptors: Vec<[u8; FIELD_DESCRIPTOR_SIZE]>,
    lengths: Vec<usize>,
    records: Vec<u8>,
    written: u32,
    record_count: Option<u32>,
    padding: usize,
    eof_marker: bool,
}

impl DbfBuilder {
    pub(crate) fn new() -> Self {
        Self {
            version: 0x03,
            descriptors: Vec::new(),
            lengths: Vec::new(),
            records: Vec::new(),
            written: 0,
            record_count: None,
            padding: 0,
            eof_marker: true,
        }
    }

    pub(crate) fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn header_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Overrides the record count stored in the header.
    pub(crate) fn record_count(mut self, count: u32) -> Self {
        self.record_count = Some(count);
        self
    }

    pub(crate) fn eof_marker(mut self, eof_marker: bool) -> Self {
        self.eof_marker = eof_marker;
        self
    }

    pub(crate) fn field(mut self, name: &str, code: u8, length: u8, decimals: u8) -> Self {
        let width = if code == b'C' {
            usize::from(u16::from_le_bytes([length, decimals]))
        } else {
            usize::from(length)
        };
        self.descriptors
            .push(field_descriptor(name, code, length, decimals));
        self.lengths.push(width);
        self
    }

    pub(crate) fn record(self, values: &[&[u8]]) -> Self {
        self.push_record(b' ', values)
    }

    pub(crate) fn deleted_record(self, values: &[&[u8]]) -> Self {
        self.push_record(b'*', values)
    }

    fn push_record(mut self, flag: u8, values: &[&[u8]]) -> Self {
        assert_eq!(values.len(), self.lengths.len(), "one value per field");
        self.records.push(flag);
        for (value, length) in values.iter().zip(&self.lengths) {
            assert_eq!(value.len(), *length, "value width must match the field");
            self.records.extend_from_slice(value);
        }
        self.written += 1;
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let header_length =
            HEADER_SIZE + self.descriptors.len() * FIELD_DESCRIPTOR_SIZE + 1 + self.padding;
        let record_length = 1 + self.lengths.iter().sum::<usize>();
        let record_count = self.record_count.unwrap_or(self.written);

        let mut bytes = Vec::with_capacity(header_length + self.records.len() + 1);
        bytes.push(self.version);
        bytes.extend_from_slice(&[124, 3, 15]);
        bytes.extend_from_slice(&record_count.to_le_bytes());
        bytes.extend_from_slice(&(header_length as u16).to_le_bytes());
        bytes.extend_from_slice(&(record_length as u16).to_le_bytes());
        bytes.resize(HEADER_SIZE, 0);

        for descriptor in &self.descriptors {
            bytes.extend_from_slice(descriptor);
        }
        bytes.push(HEADER_TERMINATOR);
        bytes.resize(header_length, 0);

        bytes.extend_from_slice(&self.records);
        if self.eof_marker {
            bytes.push(END_OF_FILE);
        }
        bytes
    }
}
