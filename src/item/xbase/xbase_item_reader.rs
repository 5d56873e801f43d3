use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{
    BatchError,
    compression::CompressionProviderFactory,
    core::item::{ItemReader, ItemReaderResult},
};

use super::{
    charset::Charset,
    field::FieldMeta,
    file_list::{FileInputList, FileSpec},
    row_shape::{Projection, RowShape},
    value::Row,
    xbase_reader::DbfReader,
};

/// Serializable settings of an [`XBaseItemReader`].
///
/// ```
/// use xbase_batch_rs::item::xbase::xbase_item_reader::XBaseInputConfig;
///
/// let config = XBaseInputConfig::from_json(r#"{
///     "files": [{ "path": "/data/exports", "mask": ".*\\.dbf", "required": true }],
///     "compression": "GZip",
///     "charset": "cp1252",
///     "row_limit": 1000,
///     "filename_field": "source_file"
/// }"#).unwrap();
///
/// assert_eq!(config.files[0].mask.as_deref(), Some(r".*\.dbf"));
/// assert_eq!(config.row_limit, 1000);
/// assert!(config.rownr_field.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XBaseInputConfig {
    pub files: Vec<FileSpec>,
    /// Compression provider name, `None` or absent for plain files
    pub compression: Option<String>,
    /// Character set label of the text fields
    pub charset: Option<String>,
    /// Maximum number of rows to read, 0 for no limit
    pub row_limit: u64,
    /// Name of the generated column holding the source file name
    pub filename_field: Option<String>,
    /// Name of the generated column holding the row number
    pub rownr_field: Option<String>,
}

impl XBaseInputConfig {
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        serde_json::from_str(json)
            .map_err(|e| BatchError::Configuration(format!("Invalid XBase input configuration: {}", e)))
    }
}

/// Opens one DBF file through the configured decompression and charset.
pub fn open_dbf(
    path: &Path,
    factory: &CompressionProviderFactory,
    compression: Option<&str>,
    charset: Charset,
) -> Result<DbfReader, BatchError> {
    let file = File::open(path)?;
    let stream = factory.open_input_stream(Box::new(BufReader::new(file)), compression)?;
    DbfReader::open_with_charset(stream, charset)
}

struct OpenFile {
    reader: DbfReader,
    projection: Projection,
    filename: String,
}

#[derive(Default)]
struct ReadState {
    next_file: usize,
    current: Option<OpenFile>,
    rows_read: u64,
}

/// Reads the rows of a list of DBF files, one file after the other.
///
/// Every row follows the merged [`RowShape`] of all files: columns a file
/// lacks are unset. Files are opened on demand and closed as soon as they
/// are exhausted or fail.
///
/// # Examples
///
/// ```no_run
/// use xbase_batch_rs::core::item::ItemReader;
/// use xbase_batch_rs::item::xbase::file_list::FileSpec;
/// use xbase_batch_rs::item::xbase::xbase_item_reader::XBaseItemReaderBuilder;
///
/// let reader = XBaseItemReaderBuilder::new()
///     .file(FileSpec::new("/data/exports").mask(r".*\.dbf").required(true))
///     .charset("cp1252")
///     .filename_field("source_file")
///     .rownr_field("rownr")
///     .build()
///     .unwrap();
///
/// while let Some(row) = reader.read().unwrap() {
///     println!("{:?}", row);
/// }
/// ```
pub struct XBaseItemReader {
    files: Vec<PathBuf>,
    factory: CompressionProviderFactory,
    compression: Option<String>,
    charset: Charset,
    row_limit: u64,
    shape: RowShape,
    state: RefCell<ReadState>,
    error: Cell<bool>,
}

impl XBaseItemReader {
    /// Output schema shared by every row.
    pub fn fields(&self) -> &[FieldMeta] {
        self.shape.fields()
    }

    pub fn shape(&self) -> &RowShape {
        &self.shape
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Returns true once any file or row has failed.
    pub fn has_error(&self) -> bool {
        self.error.get()
    }

    /// Rows handed out so far.
    pub fn rows_read(&self) -> u64 {
        self.state.borrow().rows_read
    }

    fn open_file(&self, path: &Path) -> Result<OpenFile, BatchError> {
        let reader = open_dbf(path, &self.factory, self.compression.as_deref(), self.charset)
            .map_err(|e| BatchError::file(path.display().to_string(), e))?;
        let projection = self.shape.projection(reader.fields());

        Ok(OpenFile {
            reader,
            projection,
            filename: path.display().to_string(),
        })
    }

    fn limit_reached(&self, state: &ReadState) -> bool {
        self.row_limit > 0 && state.rows_read >= self.row_limit
    }
}

impl ItemReader<Row> for XBaseItemReader {
    /// Reads the next row of the current file, moving to the next file when
    /// the current one is exhausted.
    ///
    /// # Errors
    ///
    /// - [`BatchError::File`] when a file cannot be opened or its header is invalid
    /// - the error of the failing row otherwise
    ///
    /// In both cases the file is closed and the next call goes on with the
    /// following file.
    fn read(&self) -> ItemReaderResult<Row> {
        let mut state = self.state.borrow_mut();

        loop {
            if self.limit_reached(&state) {
                if state.current.take().is_some() {
                    info!("Row limit of {} reached", self.row_limit);
                }
                return Ok(None);
            }

            if state.current.is_none() {
                let Some(path) = self.files.get(state.next_file) else {
                    return Ok(None);
                };
                state.next_file += 1;

                info!("Opening file {}", path.display());
                match self.open_file(path) {
                    Ok(open) => state.current = Some(open),
                    Err(e) => {
                        self.error.set(true);
                        return Err(e);
                    }
                }
            }

            let ReadState {
                current, rows_read, ..
            } = &mut *state;
            let Some(open) = current.as_mut() else {
                continue;
            };

            match open.reader.next_row() {
                Ok(Some(row)) => {
                    *rows_read += 1;
                    return Ok(Some(open.projection.apply(
                        row,
                        &open.filename,
                        *rows_read as i64,
                    )));
                }
                Ok(None) => {
                    info!(
                        "Finished file {} after {} records",
                        open.filename,
                        open.reader.records_read()
                    );
                    *current = None;
                }
                Err(e) => {
                    error!("Error reading file {}: {}", open.filename, e);
                    self.error.set(true);
                    *current = None;
                    return Err(e);
                }
            }
        }
    }
}

/// Builder for [`XBaseItemReader`].
#[derive(Default)]
pub struct XBaseItemReaderBuilder {
    files: Vec<FileSpec>,
    factory: Option<CompressionProviderFactory>,
    compression: Option<String>,
    charset: Option<String>,
    row_limit: u64,
    filename_field: Option<String>,
    rownr_field: Option<String>,
}

impl XBaseItemReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from serialized settings.
    pub fn from_config(config: XBaseInputConfig) -> Self {
        Self {
            files: config.files,
            factory: None,
            compression: config.compression,
            charset: config.charset,
            row_limit: config.row_limit,
            filename_field: config.filename_field,
            rownr_field: config.rownr_field,
        }
    }

    /// Adds one file or directory entry.
    pub fn file(mut self, spec: FileSpec) -> Self {
        self.files.push(spec);
        self
    }

    /// Adds a single, required file.
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.files.push(FileSpec::new(path).required(true));
        self
    }

    /// Sets the compression provider name (`None`, `Zip`, `GZip`...).
    pub fn compression<S: Into<String>>(mut self, name: S) -> Self {
        self.compression = Some(name.into());
        self
    }

    /// Replaces the default provider registry.
    pub fn compression_factory(mut self, factory: CompressionProviderFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sets the character set label of the text fields (ISO-8859-1 by default).
    pub fn charset<S: Into<String>>(mut self, label: S) -> Self {
        self.charset = Some(label.into());
        self
    }

    /// Stops after `limit` rows, 0 meaning no limit.
    pub fn row_limit(mut self, limit: u64) -> Self {
        self.row_limit = limit;
        self
    }

    pub fn filename_field<S: Into<String>>(mut self, name: S) -> Self {
        self.filename_field = Some(name.into());
        self
    }

    pub fn rownr_field<S: Into<String>>(mut self, name: S) -> Self {
        self.rownr_field = Some(name.into());
        self
    }

    /// Resolves the files, reads their schemas and builds the reader.
    ///
    /// Each file is opened once here to learn its fields, then closed.
    ///
    /// # Errors
    ///
    /// - [`BatchError::Configuration`] for an unknown charset, an invalid mask,
    ///   a missing required file or an empty file list
    /// - [`BatchError::File`] when a file cannot be opened or parsed
    /// - [`BatchError::SchemaMismatch`] when files disagree on a field type
    pub fn build(self) -> Result<XBaseItemReader, BatchError> {
        let charset = match self.charset.as_deref() {
            Some(label) => Charset::for_label(label)?,
            None => Charset::default(),
        };
        let factory = self.factory.unwrap_or_default();
        let compression = self
            .compression
            .filter(|name| !name.trim().is_empty());

        let files = FileInputList::resolve(&self.files)?;
        if files.is_empty() {
            return Err(BatchError::Configuration(
                "no input file to read".to_string(),
            ));
        }

        let mut schemas = Vec::with_capacity(files.len());
        for path in &files {
            let reader = open_dbf(path, &factory, compression.as_deref(), charset)
                .map_err(|e| BatchError::file(path.display().to_string(), e))?;
            debug!(
                "File {} has {} readable fields",
                path.display(),
                reader.fields().len()
            );
            schemas.push(reader.fields().to_vec());
        }

        let mut shape = RowShape::merge(schemas.iter().map(Vec::as_slice))?;
        if let Some(name) = self.filename_field.as_deref() {
            shape = shape.with_filename_field(name)?;
        }
        if let Some(name) = self.rownr_field.as_deref() {
            shape = shape.with_rownr_field(name)?;
        }

        info!(
            "XBase input ready: {} files, {} fields, charset {}",
            files.len(),
            shape.len(),
            charset.name()
        );

        Ok(XBaseItemReader {
            files,
            factory,
            compression,
            charset,
            row_limit: self.row_limit,
            shape,
            state: RefCell::new(ReadState::default()),
            error: Cell::new(false),
        })
    }
}
