//! Column schemas and output records
//!
//! A [`Schema`] is a fixed, ordered list of `(field id, display title)`
//! pairs. An [`OutputRecord`] can only be built through a schema, which
//! guarantees it carries exactly one value per column. Fields never set
//! become empty strings.

use tracing::warn;

/// Fixed, ordered CSV column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    columns: &'static [(&'static str, &'static str)],
}

impl Schema {
    /// Create a schema from `(field id, display title)` pairs
    pub const fn new(columns: &'static [(&'static str, &'static str)]) -> Self {
        Self { columns }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Field ids in column order
    pub fn field_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(id, _)| *id)
    }

    /// Display titles in column order (the CSV header)
    pub fn titles(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(_, title)| *title)
    }

    /// Column index of a field id
    pub fn position(&self, field_id: &str) -> Option<usize> {
        self.columns.iter().position(|(id, _)| *id == field_id)
    }

    /// Start a record for this schema
    pub fn record(&self) -> RecordBuilder<'_> {
        RecordBuilder {
            schema: self,
            values: vec![None; self.len()],
        }
    }
}

/// One flat output row, values in schema column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    values: Vec<String>,
}

impl OutputRecord {
    /// Values in column order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a field, looked up through the schema the record was built with
    pub fn get(&self, schema: &Schema, field_id: &str) -> Option<&str> {
        schema
            .position(field_id)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }
}

/// Builder that fills a record field by field
#[derive(Debug)]
pub struct RecordBuilder<'a> {
    schema: &'a Schema,
    values: Vec<Option<String>>,
}

impl RecordBuilder<'_> {
    /// Set a field
    #[must_use]
    pub fn set(mut self, field_id: &str, value: impl Into<String>) -> Self {
        match self.schema.position(field_id) {
            Some(i) => self.values[i] = Some(value.into()),
            None => warn!(field_id, "ignoring value for a field the schema does not have"),
        }
        self
    }

    /// Set a field when a value is present
    #[must_use]
    pub fn set_opt<S: Into<String>>(self, field_id: &str, value: Option<S>) -> Self {
        match value {
            Some(v) => self.set(field_id, v),
            None => self,
        }
    }

    /// Finish the record; unset fields become empty strings
    pub fn build(self) -> OutputRecord {
        OutputRecord {
            values: self
                .values
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
        }
    }
}
