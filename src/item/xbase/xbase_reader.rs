use std::io::{self, ErrorKind};

use log::{debug, warn};

use crate::{
    BatchError,
    compression::{InputStream, blocking::BlockingReader},
};

use super::{
    charset::Charset,
    field::{FieldDescriptor, FieldMeta},
    header::{DbfHeader, END_OF_FILE, RECORD_DELETED},
    value::Row,
};

/// A decoding session over one DBF stream.
///
/// The session owns its source until [`close`](DbfReader::close) is called
/// or the session is dropped. Records are read strictly sequentially, so any
/// stream works, compressed ones included.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use xbase_batch_rs::item::xbase::xbase_reader::DbfReader;
///
/// // One character field "NAME" of 3 bytes and a single record "ABC"
/// let mut bytes = vec![0x03, 124, 1, 1, 1, 0, 0, 0, 65, 0, 4, 0];
/// bytes.resize(32, 0);
/// let mut descriptor = [0u8; 32];
/// descriptor[..4].copy_from_slice(b"NAME");
/// descriptor[11] = b'C';
/// descriptor[16] = 3;
/// bytes.extend_from_slice(&descriptor);
/// bytes.push(0x0D);
/// bytes.extend_from_slice(b" ABC");
///
/// let mut reader = DbfReader::open(Box::new(Cursor::new(bytes))).unwrap();
/// assert_eq!(reader.fields()[0].name, "NAME");
///
/// let row = reader.next_row().unwrap().unwrap();
/// assert_eq!(row[0].as_ref().and_then(|value| value.as_str()), Some("ABC"));
/// assert!(reader.next_row().unwrap().is_none());
/// ```
pub struct DbfReader {
    source: Option<InputStream>,
    header: DbfHeader,
    fields: Vec<FieldMeta>,
    charset: Charset,
    record: Vec<u8>,
    records_read: u32,
    /// Body bytes still owed by a record whose read failed
    pending: usize,
    finished: bool,
    error: bool,
}

impl DbfReader {
    /// Opens a session with the default character set.
    pub fn open(source: InputStream) -> Result<Self, BatchError> {
        Self::open_with_charset(source, Charset::default())
    }

    /// Parses the header and field table of `source` and returns a session
    /// positioned on the first record.
    ///
    /// # Errors
    /// [`BatchError::Format`] or [`BatchError::Io`] when the header cannot be
    /// read. The source is released before returning.
    pub fn open_with_charset(mut source: InputStream, charset: Charset) -> Result<Self, BatchError> {
        let header = DbfHeader::read_from(source.as_mut())?;

        let mut fields = Vec::with_capacity(header.fields.len());
        for descriptor in &header.fields {
            match descriptor.to_meta() {
                Some(meta) => fields.push(meta),
                None => debug!(
                    "Unknown type for field {}: 0x{:02X}, field skipped",
                    descriptor.name,
                    descriptor.field_type.code()
                ),
            }
        }

        debug!(
            "Opened DBF version 0x{:02X}: {} records of {} bytes, {} of {} fields readable",
            header.version,
            header.record_count,
            header.record_length,
            fields.len(),
            header.fields.len()
        );

        let record = vec![0u8; header.record_length - 1];

        Ok(Self {
            source: Some(source),
            header,
            fields,
            charset,
            record,
            records_read: 0,
            pending: 0,
            finished: false,
            error: false,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// Every raw field of the file, unsupported ones included.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.header.fields
    }

    /// Output schema: one entry per decodable field, in file order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Number of physical records consumed so far, deleted ones included.
    pub fn records_read(&self) -> u32 {
        self.records_read
    }

    /// Returns true once any read has failed.
    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Releases the source. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("Closed DBF reader after {} records", self.records_read);
        }
    }

    /// Decodes the next live record.
    ///
    /// Returns `Ok(None)` once the data is exhausted, and keeps doing so.
    ///
    /// # Errors
    ///
    /// - [`BatchError::Field`] when a field cannot be decoded, or when the
    ///   source fails or ends inside a field. A failure only loses its own
    ///   record: the next call first consumes what is left of it, then
    ///   continues with the following one.
    /// - [`BatchError::Io`] when the source fails between records.
    /// - [`BatchError::ItemReader`] when the session has been closed.
    pub fn next_row(&mut self) -> Result<Option<Row>, BatchError> {
        let result = self.read_next();
        if result.is_err() {
            self.error = true;
        }
        result
    }

    fn read_next(&mut self) -> Result<Option<Row>, BatchError> {
        let Some(source) = self.source.as_mut() else {
            return Err(BatchError::ItemReader("reader closed".to_string()));
        };

        if self.finished {
            return Ok(None);
        }

        let mut reader = BlockingReader::new(source.as_mut());
        let length = self.record.len();

        if self.pending > 0 {
            let mut read = length - self.pending;
            let result = reader.fill(&mut self.record, &mut read);
            self.pending = length - read;

            if let Err(e) = result {
                return Err(field_error(&self.header.fields, read, BatchError::Io(e)));
            }
            if self.pending > 0 {
                self.finished = true;
                return Err(truncated(&self.header.fields, read));
            }
            debug!("Skipped the rest of record {}", self.records_read);
        }

        loop {
            if self.records_read >= self.header.record_count {
                self.finished = true;
                return Ok(None);
            }

            let mut flag = [0u8; 1];
            if reader.read_fully(&mut flag, 0, 1)? == 0 || flag[0] == END_OF_FILE {
                debug!("End of data after {} records", self.records_read);
                self.finished = true;
                return Ok(None);
            }

            let mut read = 0;
            let result = reader.fill(&mut self.record, &mut read);
            self.records_read += 1;

            if let Err(e) = result {
                self.pending = length - read;
                warn!(
                    "Read of record {} failed after {} bytes: {}",
                    self.records_read, read, e
                );
                return Err(field_error(&self.header.fields, read, BatchError::Io(e)));
            }

            if read < length {
                self.finished = true;
                return Err(truncated(&self.header.fields, read));
            }

            if flag[0] == RECORD_DELETED {
                continue;
            }

            return decode_record(&self.header.fields, &self.record, &self.charset).map(Some);
        }
    }
}

impl Drop for DbfReader {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode_record(
    descriptors: &[FieldDescriptor],
    record: &[u8],
    charset: &Charset,
) -> Result<Row, BatchError> {
    let mut row = Row::with_capacity(descriptors.len());
    let mut offset = 0;

    for (index, descriptor) in descriptors.iter().enumerate() {
        let bytes = &record[offset..offset + descriptor.length];
        offset += descriptor.length;

        if !descriptor.field_type.is_supported() {
            continue;
        }

        let value = descriptor
            .decode(bytes, charset)
            .map_err(|e| BatchError::field(index + 1, &descriptor.name, e))?;
        row.push(value);
    }

    Ok(row)
}

/// Error for a record whose body stopped after `read` bytes.
fn truncated(descriptors: &[FieldDescriptor], read: usize) -> BatchError {
    let error = field_error(
        descriptors,
        read,
        BatchError::Io(io::Error::new(ErrorKind::UnexpectedEof, "record truncated")),
    );
    if let BatchError::Field { index, name, .. } = &error {
        warn!(
            "Record truncated in field #{} ({}) after {} bytes",
            index, name, read
        );
    }
    error
}

/// Attributes `source` to the raw field holding body byte `read`.
fn field_error(descriptors: &[FieldDescriptor], read: usize, source: BatchError) -> BatchError {
    let mut end = 0;
    for (index, descriptor) in descriptors.iter().enumerate() {
        end += descriptor.length;
        if read < end {
            return BatchError::field(index + 1, &descriptor.name, source);
        }
    }

    source
}
