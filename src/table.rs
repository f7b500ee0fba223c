//! Tab-separated output.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{Error, Field, Record};

/// The nine canonical column names, in canonical order.
pub fn canonical_columns() -> Vec<String> {
    Field::ALL.iter().map(|f| f.as_str().to_string()).collect()
}

/// Writes a header row and then one row per record, in call order.
pub struct TableWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<String>,
    rows: usize,
}

impl<W: Write> TableWriter<W> {
    /// Create a writer and emit the header row.
    pub fn new(inner: W, columns: Vec<String>) -> Result<Self, Error> {
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(Terminator::Any(b'\n'))
            .quote_style(QuoteStyle::Necessary)
            .flexible(false)
            .from_writer(inner);
        writer.write_record(&columns)?;
        Ok(Self {
            writer,
            columns,
            rows: 0,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Write one row, padded with empty cells or truncated to the column count.
    pub fn write_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<(), Error> {
        let width = self.columns.len();
        let row = (0..width).map(|i| cells.get(i).map(|c| c.as_ref()).unwrap_or(""));
        self.writer.write_record(row)?;
        self.rows += 1;
        Ok(())
    }

    /// Write a record's values in column order. Missing fields are empty.
    pub fn write_record(&mut self, record: &Record) -> Result<(), Error> {
        let row: Vec<&str> = self.columns.iter().map(|c| record.column(c)).collect();
        self.write_row(&row)
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn finish(self) -> Result<W, Error> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

impl TableWriter<File> {
    /// Create (or truncate) a file and emit the header row.
    pub fn create<P: AsRef<Path>>(path: P, columns: Vec<String>) -> Result<Self, Error> {
        Self::new(File::create(path)?, columns)
    }
}
