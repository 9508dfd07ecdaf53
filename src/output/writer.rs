//! CSV record sink
//!
//! Writes a full record set in one go. Rows are written to a temporary file
//! next to the destination which is renamed into place once everything has
//! been flushed, so readers never see a half-written file.

use super::schema::{OutputRecord, Schema};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for one output file
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Create a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn sink_error(&self, message: impl std::fmt::Display) -> Error {
        Error::sink(self.path.display().to_string(), message.to_string())
    }

    /// Write the header and every record; returns the number of rows written
    pub fn write(&self, schema: &Schema, records: &[OutputRecord]) -> Result<usize> {
        if let Some(bad) = records.iter().position(|r| r.len() != schema.len()) {
            return Err(self.sink_error(format!(
                "record {bad} has {} fields, schema has {}",
                records[bad].len(),
                schema.len()
            )));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| self.sink_error(format!("cannot create {}: {e}", parent.display())))?;
        }

        let temp = self.temp_path();
        let result = self.write_rows(&temp, schema, records);
        if result.is_err() {
            let _ = fs::remove_file(&temp);
            return result;
        }

        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            self.sink_error(e)
        })?;

        debug!(path = %self.path.display(), rows = records.len(), "wrote output file");
        Ok(records.len())
    }

    fn write_rows(&self, temp: &Path, schema: &Schema, records: &[OutputRecord]) -> Result<usize> {
        let mut writer = csv::Writer::from_path(temp).map_err(|e| self.sink_error(e))?;

        writer
            .write_record(schema.titles())
            .map_err(|e| self.sink_error(e))?;
        for record in records {
            writer
                .write_record(record.values())
                .map_err(|e| self.sink_error(e))?;
        }
        writer.flush().map_err(|e| self.sink_error(e))?;

        Ok(records.len())
    }
}
