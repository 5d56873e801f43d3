use log::debug;

use crate::BatchError;

use super::{
    field::{FieldMeta, Length, ValueType},
    value::{Row, Value},
};

/// Layout of the rows produced from several files.
///
/// The data columns are the union of the file schemas in order of first
/// appearance, followed by the optional file name and row number columns.
/// Column names are compared case-insensitively, as dBase does.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowShape {
    fields: Vec<FieldMeta>,
    data_len: usize,
    filename_index: Option<usize>,
    rownr_index: Option<usize>,
}

impl RowShape {
    /// Merges file schemas into one shape.
    ///
    /// A column present in several files keeps the widest length.
    ///
    /// # Errors
    /// [`BatchError::SchemaMismatch`] when two files declare the same column
    /// with different value types, or when one file declares a column twice.
    pub fn merge<'a, I>(schemas: I) -> Result<Self, BatchError>
    where
        I: IntoIterator<Item = &'a [FieldMeta]>,
    {
        let mut fields: Vec<FieldMeta> = Vec::new();

        for schema in schemas {
            for (position, field) in schema.iter().enumerate() {
                if schema[..position]
                    .iter()
                    .any(|earlier| earlier.name.eq_ignore_ascii_case(&field.name))
                {
                    return Err(BatchError::SchemaMismatch(format!(
                        "field {} appears twice in one file",
                        field.name
                    )));
                }

                match fields
                    .iter_mut()
                    .find(|known| known.name.eq_ignore_ascii_case(&field.name))
                {
                    Some(known) if known.value_type != field.value_type => {
                        return Err(BatchError::SchemaMismatch(format!(
                            "field {} is {} in one file and {} in another",
                            field.name, known.value_type, field.value_type
                        )));
                    }
                    Some(known) => known.length = known.length.widen(field.length),
                    None => fields.push(field.clone()),
                }
            }
        }

        debug!("Merged row shape has {} fields", fields.len());

        Ok(Self {
            data_len: fields.len(),
            fields,
            filename_index: None,
            rownr_index: None,
        })
    }

    /// Appends a string column holding the source file name.
    pub fn with_filename_field(mut self, name: &str) -> Result<Self, BatchError> {
        self.filename_index = Some(self.push_generated(name, ValueType::String)?);
        Ok(self)
    }

    /// Appends an integer column holding the 1-based row number.
    pub fn with_rownr_field(mut self, name: &str) -> Result<Self, BatchError> {
        self.rownr_index = Some(self.push_generated(name, ValueType::Integer)?);
        Ok(self)
    }

    fn push_generated(&mut self, name: &str, value_type: ValueType) -> Result<usize, BatchError> {
        if self.index_of(name).is_some() {
            return Err(BatchError::Configuration(format!(
                "generated field {} clashes with an existing field",
                name
            )));
        }

        self.fields
            .push(FieldMeta::new(name, value_type, Length::Unspecified));
        Ok(self.fields.len() - 1)
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Precomputes the placement of the columns of one file.
    pub fn projection(&self, file_fields: &[FieldMeta]) -> Projection {
        let slots = file_fields
            .iter()
            .map(|field| {
                self.fields[..self.data_len]
                    .iter()
                    .position(|known| known.name.eq_ignore_ascii_case(&field.name))
            })
            .collect();

        Projection {
            slots,
            width: self.fields.len(),
            filename_index: self.filename_index,
            rownr_index: self.rownr_index,
        }
    }

    /// Places a row decoded with `file_fields` into this shape.
    ///
    /// Columns missing from the file are left unset.
    pub fn project(&self, file_fields: &[FieldMeta], row: Row, filename: &str, rownr: i64) -> Row {
        self.projection(file_fields).apply(row, filename, rownr)
    }
}

/// Placement of the columns of one file in a [`RowShape`].
#[derive(Debug, Clone)]
pub struct Projection {
    /// Target column of each file column
    slots: Vec<Option<usize>>,
    width: usize,
    filename_index: Option<usize>,
    rownr_index: Option<usize>,
}

impl Projection {
    pub fn apply(&self, row: Row, filename: &str, rownr: i64) -> Row {
        let mut projected: Row = vec![None; self.width];

        for (value, slot) in row.into_iter().zip(&self.slots) {
            if let Some(index) = slot {
                projected[*index] = value;
            }
        }

        if let Some(index) = self.filename_index {
            projected[index] = Some(Value::String(filename.to_string()));
        }
        if let Some(index) = self.rownr_index {
            projected[index] = Some(Value::Integer(rownr));
        }

        projected
    }
}
