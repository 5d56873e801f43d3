//! DBF table fixtures written from textual values.
use std::{fs, io, path::Path};

struct Column {
    name: String,
    code: u8,
    length: usize,
    decimals: u8,
}

pub struct Table {
    columns: Vec<Column>,
    records: Vec<u8>,
    count: u32,
}

impl Table {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            records: Vec::new(),
            count: 0,
        }
    }

    pub fn field(mut self, name: &str, code: u8, length: usize, decimals: u8) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            code,
            length,
            decimals,
        });
        self
    }

    pub fn character(self, name: &str, length: usize) -> Self {
        self.field(name, b'C', length, 0)
    }

    pub fn numeric(self, name: &str, length: usize, decimals: u8) -> Self {
        self.field(name, b'N', length, decimals)
    }

    pub fn integer(self, name: &str) -> Self {
        self.field(name, b'I', 4, 0)
    }

    pub fn logical(self, name: &str) -> Self {
        self.field(name, b'L', 1, 0)
    }

    pub fn date(self, name: &str) -> Self {
        self.field(name, b'D', 8, 0)
    }

    /// Appends a live record. Text is left aligned, numbers right aligned.
    pub fn row(self, values: &[&str]) -> Self {
        self.push(b' ', values)
    }

    pub fn deleted_row(self, values: &[&str]) -> Self {
        self.push(b'*', values)
    }

    fn push(mut self, flag: u8, values: &[&str]) -> Self {
        assert_eq!(values.len(), self.columns.len());
        self.records.push(flag);

        for (value, column) in values.iter().zip(&self.columns) {
            let bytes = match column.code {
                b'I' => value.parse::<i32>().unwrap().to_le_bytes().to_vec(),
                b'N' | b'F' => {
                    let mut bytes = vec![b' '; column.length.saturating_sub(value.len())];
                    bytes.extend_from_slice(value.as_bytes());
                    bytes
                }
                _ => {
                    let mut bytes = value.as_bytes().to_vec();
                    bytes.resize(bytes.len().max(column.length), b' ');
                    bytes
                }
            };
            assert_eq!(bytes.len(), column.length, "value {} too long", value);
            self.records.extend_from_slice(&bytes);
        }

        self.count += 1;
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let header_length = 32 + 32 * self.columns.len() + 1;
        let record_length = 1 + self.columns.iter().map(|c| c.length).sum::<usize>();

        let mut bytes = vec![0x03, 125, 6, 30];
        bytes.extend_from_slice(&self.count.to_le_bytes());
        bytes.extend_from_slice(&(header_length as u16).to_le_bytes());
        bytes.extend_from_slice(&(record_length as u16).to_le_bytes());
        bytes.resize(32, 0);

        for column in &self.columns {
            let mut descriptor = [0u8; 32];
            descriptor[..column.name.len()].copy_from_slice(column.name.as_bytes());
            descriptor[11] = column.code;
            descriptor[16] = column.length as u8;
            descriptor[17] = column.decimals;
            bytes.extend_from_slice(&descriptor);
        }
        bytes.push(0x0D);

        bytes.extend_from_slice(&self.records);
        bytes.push(0x1A);
        bytes
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.bytes())
    }
}
