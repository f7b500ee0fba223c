//! Record loaders for bulk export files.
//!
//! JSON documents are tried as a whole first; if that fails the text goes
//! through the object scanner so that every well-formed (or repairable)
//! object is still recovered. Delimited tables are streamed row by row.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecordsIntoIter};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::scanner::{parse_candidate, scan_str, strip_trailing_commas};
use crate::{Error, RawRecord};

/// Keys of a top-level object that hold the dataset list, in priority order.
pub const CONTAINER_KEYS: &[&str] = &["datasets", "projects", "data"];

/// How a JSON document was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// A top-level array.
    Array,
    /// A top-level object holding the list under one of [`CONTAINER_KEYS`].
    Container(&'static str),
    /// A single dataset object.
    Single,
    /// Objects recovered one by one by the scanner.
    Concatenated,
    /// Whole document parsed after removing trailing commas.
    Repaired,
    /// Nothing usable.
    Empty,
}

/// Result of loading a JSON document.
#[derive(Debug, Clone)]
pub struct JsonLoad {
    pub layout: JsonLayout,
    pub records: Vec<RawRecord>,
    /// Items or candidates that could not be turned into an object.
    pub failed: usize,
}

/// Load a JSON export from disk.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<JsonLoad, Error> {
    let bytes = fs::read(path)?;
    Ok(load_json_str(&String::from_utf8_lossy(&bytes)))
}

/// Load a JSON export from text.
pub fn load_json_str(content: &str) -> JsonLoad {
    let content = content.trim_start_matches('\u{feff}').trim();

    match serde_json::from_str::<Value>(content) {
        Ok(value) => return from_document(value, false),
        Err(e) => debug!(error = %e, "whole-document parse failed"),
    }

    let mut records = Vec::new();
    let mut failed = 0;
    for (i, candidate) in scan_str(content).enumerate() {
        // Scanning an in-memory string cannot fail.
        let Ok(candidate) = candidate else { continue };
        match parse_candidate(&candidate) {
            Some(obj) => records.push(obj),
            None => {
                failed += 1;
                warn!(object = i + 1, "failed to parse JSON object");
            }
        }
    }

    if !records.is_empty() {
        info!(
            recovered = records.len(),
            failed, "loaded datasets from concatenated JSON objects"
        );
        return JsonLoad {
            layout: JsonLayout::Concatenated,
            records,
            failed,
        };
    }

    match serde_json::from_str::<Value>(&strip_trailing_commas(content)) {
        Ok(value) => from_document(value, true),
        Err(e) => {
            warn!(error = %e, "JSON could not be repaired");
            JsonLoad {
                layout: JsonLayout::Empty,
                records: Vec::new(),
                failed,
            }
        }
    }
}

fn from_document(value: Value, repaired: bool) -> JsonLoad {
    let (layout, items) = match value {
        Value::Array(items) => (JsonLayout::Array, items),
        Value::Object(mut map) => {
            let key = CONTAINER_KEYS
                .iter()
                .copied()
                .find(|key| matches!(map.get(*key), Some(Value::Array(_))));
            match key.and_then(|key| map.remove(key).map(|items| (key, items))) {
                Some((key, Value::Array(items))) => (JsonLayout::Container(key), items),
                _ => (JsonLayout::Single, vec![Value::Object(map)]),
            }
        }
        other => {
            warn!(kind = value_kind(&other), "unexpected top-level JSON value");
            (JsonLayout::Empty, Vec::new())
        }
    };

    let mut records = Vec::with_capacity(items.len());
    let mut failed = 0;
    for item in items {
        match item {
            Value::Object(map) => records.push(map),
            other => {
                failed += 1;
                debug!(kind = value_kind(&other), "skipping non-object item");
            }
        }
    }

    info!(layout = ?layout, count = records.len(), "loaded JSON datasets");

    JsonLoad {
        layout: if repaired && layout != JsonLayout::Empty {
            JsonLayout::Repaired
        } else {
            layout
        },
        records,
        failed,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Streaming reader over a delimited table with a header row.
///
/// Rows may be shorter or longer than the header; they are yielded as-is.
pub struct DelimitedRows<R> {
    headers: Vec<String>,
    records: StringRecordsIntoIter<R>,
}

impl<R: Read> DelimitedRows<R> {
    /// Read the header row and prepare to stream the rest.
    pub fn new(reader: R, delimiter: u8) -> Result<Self, Error> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        debug!(columns = ?headers, "table columns");

        Ok(Self {
            headers,
            records: reader.into_records(),
        })
    }

    /// Column names, exactly as in the header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Map a row onto its header names.
    ///
    /// Cells past the header are dropped; missing cells are absent from the
    /// result. A repeated header name keeps its last cell.
    pub fn raw_record(&self, row: &[String]) -> RawRecord {
        self.headers
            .iter()
            .zip(row)
            .map(|(name, cell)| (name.clone(), Value::String(cell.clone())))
            .collect()
    }
}

impl DelimitedRows<BufReader<File>> {
    /// Open a delimited file on disk.
    pub fn open<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), delimiter)
    }
}

impl<R: Read> Iterator for DelimitedRows<R> {
    type Item = Result<Vec<String>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|result| {
            result
                .map(|record| record.iter().map(str::to_string).collect())
                .map_err(Error::from)
        })
    }
}
