//! Input format detection for bulk export files.
//!
//! Only the first few lines are inspected: a leading `{` or `[` means JSON,
//! otherwise a tab means TSV and a comma means CSV.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::Error;

/// Lines inspected when sniffing a file.
const SNIFF_LINES: usize = 3;

/// Lines surfaced to the user when the format cannot be determined.
pub const PREVIEW_LINES: usize = 10;

/// Detected bulk input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Json,
    Csv,
    Tsv,
    Unknown,
}

impl FileFormat {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Csv => "csv",
            FileFormat::Tsv => "tsv",
            FileFormat::Unknown => "unknown",
        }
    }

    /// Field delimiter for delimited formats.
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            FileFormat::Csv => Some(b','),
            FileFormat::Tsv => Some(b'\t'),
            FileFormat::Json | FileFormat::Unknown => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a single line.
///
/// A line opening with a double quote gets the same tab-before-comma
/// tie-break as any other line.
pub fn classify_line(line: &str) -> FileFormat {
    // Tabs are kept: a row may start or end with an empty cell.
    let blank = |c: char| c != '\t' && c.is_whitespace();
    let line = line
        .trim_start_matches('\u{feff}')
        .trim_start_matches(blank)
        .trim_end_matches(blank);

    if line.starts_with('{') || line.starts_with('[') {
        FileFormat::Json
    } else if line.contains('\t') {
        FileFormat::Tsv
    } else if line.contains(',') {
        FileFormat::Csv
    } else {
        FileFormat::Unknown
    }
}

/// Detect the format from the first non-empty line among the first few.
pub fn detect_format<R: BufRead>(reader: R) -> Result<FileFormat, Error> {
    let lines = read_lines(reader, SNIFF_LINES)?;

    for (i, line) in lines.iter().enumerate() {
        debug!(line = i + 1, text = ?truncate(line, 100), "sniffed line");
    }

    let format = lines
        .iter()
        .find(|line| !line.trim_start_matches('\u{feff}').trim().is_empty())
        .map(|line| classify_line(line))
        .unwrap_or(FileFormat::Unknown);

    Ok(format)
}

/// Detect the format of a file on disk.
pub fn detect_file_format<P: AsRef<Path>>(path: P) -> Result<FileFormat, Error> {
    let file = File::open(path)?;
    detect_format(BufReader::new(file))
}

/// Read up to `limit` raw lines of a file, for diagnostics.
pub fn preview_lines<P: AsRef<Path>>(path: P, limit: usize) -> Result<Vec<String>, Error> {
    let file = File::open(path)?;
    read_lines(BufReader::new(file), limit)
}

fn read_lines<R: BufRead>(mut reader: R, limit: usize) -> Result<Vec<String>, Error> {
    let mut lines = Vec::with_capacity(limit);
    let mut buf = Vec::new();

    while lines.len() < limit {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        lines.push(line.trim_end_matches(['\r', '\n']).to_string());
    }

    Ok(lines)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> FileFormat {
        detect_format(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_json_object_and_array() {
        assert_eq!(detect("{\"accession\": \"PXD000001\"}\n"), FileFormat::Json);
        assert_eq!(detect("[\n  {\"a\": 1}\n]"), FileFormat::Json);
    }

    #[test]
    fn test_tsv_wins_over_csv() {
        assert_eq!(detect("accession\ttitle, subtitle\n"), FileFormat::Tsv);
        assert_eq!(detect("accession,title\nPXD1,x\n"), FileFormat::Csv);
    }

    #[test]
    fn test_edge_tabs_mark_tsv() {
        assert_eq!(detect("accession\t\nPXD1\t\n"), FileFormat::Tsv);
        assert_eq!(detect("\ttitle\nPXD1\tx\n"), FileFormat::Tsv);
        assert_eq!(classify_line("accession\t  \r"), FileFormat::Tsv);
        assert_eq!(classify_line("  {\"a\": 1}  "), FileFormat::Json);
    }

    #[test]
    fn test_leading_quote_tie_break() {
        assert_eq!(detect("\"accession\",\"title\"\n"), FileFormat::Csv);
        assert_eq!(detect("\"accession\"\t\"title\"\n"), FileFormat::Tsv);
    }

    #[test]
    fn test_skips_leading_blank_lines() {
        assert_eq!(detect("\n   \n{\"a\": 1}"), FileFormat::Json);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(detect("just some words\n"), FileFormat::Unknown);
        assert_eq!(detect(""), FileFormat::Unknown);
        assert_eq!(detect("\n\n\n{\"too\": \"late\"}"), FileFormat::Unknown);
    }

    #[test]
    fn test_bom_is_ignored() {
        assert_eq!(detect("\u{feff}{\"a\": 1}"), FileFormat::Json);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(FileFormat::Csv.delimiter(), Some(b','));
        assert_eq!(FileFormat::Tsv.delimiter(), Some(b'\t'));
        assert_eq!(FileFormat::Json.delimiter(), None);
    }

    #[test]
    fn test_preview_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"one\r\ntwo\nthree\n").unwrap();
        let lines = preview_lines(file.path(), 2).unwrap();
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }
}
