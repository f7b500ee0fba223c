//! Resilient scanner for JSON exports that are not a single valid document.
//!
//! The scanner walks a byte stream once and cuts out every balanced top-level
//! `{...}` object as a candidate string. Objects may be concatenated with no
//! separator, wrapped in an array, or split across lines; string literals are
//! tracked so braces inside quoted values do not affect the depth count.
//!
//! Candidates are parsed independently by [`parse_candidate`], so one broken
//! object never stops the scan of the ones after it.
//!
//! # State machine
//!
//! | state          | byte          | next state     | effect                       |
//! |----------------|---------------|----------------|------------------------------|
//! | `Outside`      | `{`           | `Object`       | start buffer, depth = 1      |
//! | `Outside`      | other         | `Outside`      | discarded                    |
//! | `Object`       | `"`           | `String`       |                              |
//! | `Object`       | `\`           | `ObjectEscape` |                              |
//! | `Object`       | `{`           | `Object`       | depth + 1                    |
//! | `Object`       | `}`           | `Object`       | depth - 1                    |
//! | `Object`       | `}` (depth 0) | `Outside`      | emit candidate               |
//! | `ObjectEscape` | any           | `Object`       |                              |
//! | `String`       | `"`           | `Object`       |                              |
//! | `String`       | `\`           | `StringEscape` |                              |
//! | `StringEscape` | any           | `String`       |                              |
//!
//! Every byte seen while not `Outside` is appended to the buffer. Scanning is
//! byte-wise: all structural characters are ASCII, and UTF-8 continuation
//! bytes never collide with them.

mod repair;

pub use repair::{
    best_effort_repair, parse_candidate, parse_candidate_with, strip_trailing_commas, ParseAttempt,
};

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use crate::Error;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Between top-level objects.
    Outside,
    /// Inside an object, outside any string literal.
    Object,
    /// A backslash was seen inside an object but outside a string literal.
    ObjectEscape,
    /// Inside a string literal.
    String,
    /// A backslash was seen inside a string literal.
    StringEscape,
}

/// The byte-level state machine, independent of any reader.
#[derive(Debug)]
struct Machine {
    state: ScanState,
    depth: usize,
    buffer: Vec<u8>,
}

impl Machine {
    fn new() -> Self {
        Self {
            state: ScanState::Outside,
            depth: 0,
            buffer: Vec::new(),
        }
    }

    /// Feed one byte; returns a candidate when a top-level object closes.
    fn feed(&mut self, byte: u8) -> Option<String> {
        if self.state == ScanState::Outside {
            if byte == b'{' {
                self.buffer.clear();
                self.buffer.push(byte);
                self.depth = 1;
                self.state = ScanState::Object;
            }
            return None;
        }

        self.buffer.push(byte);

        self.state = match (self.state, byte) {
            (ScanState::Object, b'"') => ScanState::String,
            (ScanState::Object, b'\\') => ScanState::ObjectEscape,
            (ScanState::Object, b'{') => {
                self.depth += 1;
                ScanState::Object
            }
            (ScanState::Object, b'}') => {
                self.depth -= 1;
                if self.depth == 0 {
                    self.state = ScanState::Outside;
                    return Some(self.take());
                }
                ScanState::Object
            }
            (ScanState::ObjectEscape, _) => ScanState::Object,
            (ScanState::String, b'"') => ScanState::Object,
            (ScanState::String, b'\\') => ScanState::StringEscape,
            (ScanState::StringEscape, _) => ScanState::String,
            (state, _) => state,
        };

        None
    }

    /// Whatever is left once the input ends, if anything.
    fn finish(&mut self) -> Option<String> {
        self.state = ScanState::Outside;
        self.depth = 0;
        let leftover = self.take();
        let trimmed = leftover.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn take(&mut self) -> String {
        let bytes = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Lazy, single-pass iterator over candidate object strings.
///
/// Not restartable: once the underlying reader is consumed, the scanner is
/// exhausted. An I/O error is yielded once and ends the scan.
pub struct ObjectScanner<R> {
    reader: R,
    machine: Machine,
    emitted: usize,
    done: bool,
}

impl<R: BufRead> ObjectScanner<R> {
    /// Scan a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            machine: Machine::new(),
            emitted: 0,
            done: false,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> ScanState {
        self.machine.state
    }

    /// Current brace depth.
    pub fn depth(&self) -> usize {
        self.machine.depth
    }

    /// Number of candidates yielded so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl ObjectScanner<BufReader<File>> {
    /// Scan a file on disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for ObjectScanner<R> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let (consumed, candidate) = {
                let available = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e.into()));
                    }
                };

                if available.is_empty() {
                    self.done = true;
                    let leftover = self.machine.finish();
                    if leftover.is_some() {
                        self.emitted += 1;
                    }
                    return leftover.map(Ok);
                }

                let mut candidate = None;
                let mut consumed = available.len();
                for (i, &byte) in available.iter().enumerate() {
                    if let Some(object) = self.machine.feed(byte) {
                        candidate = Some(object);
                        consumed = i + 1;
                        break;
                    }
                }
                (consumed, candidate)
            };

            self.reader.consume(consumed);

            if let Some(object) = candidate {
                self.emitted += 1;
                return Some(Ok(object));
            }
        }
    }
}

/// Scan an in-memory string.
pub fn scan_str(text: &str) -> ObjectScanner<&[u8]> {
    ObjectScanner::new(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(text: &str) -> Vec<String> {
        scan_str(text).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_concatenated_without_separator() {
        assert_eq!(candidates(r#"{"a":1}{"b":2}"#), vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn test_brace_inside_string() {
        let text = r#"{"text": "a } brace"}"#;
        assert_eq!(candidates(text), vec![text]);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"text": "say \"}\" twice"}"#;
        assert_eq!(candidates(text), vec![text]);
    }

    #[test]
    fn test_nested_objects_stay_whole() {
        let text = r#"{"instruments": [{"name": "timsTOF Pro"}, {"name": "Q Exactive"}]}"#;
        assert_eq!(candidates(text), vec![text]);
    }

    #[test]
    fn test_array_wrapper_and_separators_discarded() {
        let text = "[\n  {\"a\": 1},\n  {\"b\": 2},\n]\n";
        assert_eq!(candidates(text), vec!["{\"a\": 1}", "{\"b\": 2}"]);
    }

    #[test]
    fn test_newlines_inside_strings() {
        let text = "{\"description\": \"line one\nline two { not a brace\"}\n{\"b\": 2}";
        let found = candidates(text);
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("line two"));
    }

    #[test]
    fn test_unterminated_object_is_emitted_at_end() {
        let found = candidates("{\"a\": 1}\n{\"b\": 2, \"c\": ");
        assert_eq!(found, vec!["{\"a\": 1}", "{\"b\": 2, \"c\":"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(candidates("").is_empty());
        assert!(candidates("  \n\t ").is_empty());
    }

    #[test]
    fn test_multibyte_text_preserved() {
        let text = r#"{"title": "Tumör immunopeptidome – Ωmega"}"#;
        assert_eq!(candidates(text), vec![text]);
    }

    #[test]
    fn test_state_transitions() {
        let mut machine = Machine::new();
        assert_eq!(machine.feed(b'x'), None);
        assert_eq!(machine.state, ScanState::Outside);

        machine.feed(b'{');
        assert_eq!(machine.state, ScanState::Object);
        assert_eq!(machine.depth, 1);

        machine.feed(b'"');
        assert_eq!(machine.state, ScanState::String);
        machine.feed(b'\\');
        assert_eq!(machine.state, ScanState::StringEscape);
        machine.feed(b'"');
        assert_eq!(machine.state, ScanState::String);
        machine.feed(b'{');
        assert_eq!(machine.depth, 1);
        machine.feed(b'"');
        assert_eq!(machine.state, ScanState::Object);

        machine.feed(b'\\');
        assert_eq!(machine.state, ScanState::ObjectEscape);
        machine.feed(b'"');
        assert_eq!(machine.state, ScanState::Object);

        assert_eq!(machine.feed(b'}'), Some(r#"{"\"{"\""#.to_string() + "}"));
        assert_eq!(machine.state, ScanState::Outside);
    }

    #[test]
    fn test_scanner_counts_and_fuses() {
        let mut scanner = scan_str(r#"{"a":1} {"b":2}"#);
        assert!(scanner.next().is_some());
        assert_eq!(scanner.emitted(), 1);
        assert_eq!(scanner.state(), ScanState::Outside);
        assert!(scanner.next().is_some());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
        assert_eq!(scanner.emitted(), 2);
        assert_eq!(scanner.depth(), 0);
    }

    #[test]
    fn test_small_read_buffer() {
        let text = r#"{"a": "}{"} {"b": [1, {"c": 2}]}"#;
        let reader = BufReader::with_capacity(3, text.as_bytes());
        let found: Vec<String> = ObjectScanner::new(reader).map(Result::unwrap).collect();
        assert_eq!(found, vec![r#"{"a": "}{"}"#, r#"{"b": [1, {"c": 2}]}"#]);
    }
}
