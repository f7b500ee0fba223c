//! Tolerant parsing of candidate objects.
//!
//! Attempts, in order:
//! 1. strict JSON
//! 2. trailing commas before `}` / `]` removed
//! 3. [`best_effort_repair`] on top of step 2
//!
//! A candidate that fails all three yields `None`; nothing is raised.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::RawRecord;

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

// A word-like key directly after `{` or `,`.
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*):").unwrap());

/// Which attempt produced a parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseAttempt {
    Strict,
    TrailingCommas,
    BestEffort,
}

/// Remove commas that directly precede a closing brace or bracket.
///
/// Not string-aware: a literal `", }"` inside a quoted value is rewritten too.
/// It only runs after strict parsing has already failed.
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Heuristic repair for hand-edited or non-JSON object literals.
///
/// Quotes bare word-like keys (`{id: 1}` becomes `{"id": 1}`) and turns every
/// single quote into a double quote.
///
/// Known failure modes, left as-is:
/// - apostrophes inside legitimately double-quoted values (`"Crohn's"`) become
///   stray quotes and usually make the object unparseable
/// - text such as `"a, b: c"` inside a quoted value looks like a bare key and
///   gets quotes inserted
///
/// The result is only ever used if it parses, so corruption shows up as a
/// failed object rather than silently altered content in most cases.
pub fn best_effort_repair(text: &str) -> String {
    let quoted = BARE_KEY.replace_all(text, r#"${1}"${2}"${3}:"#);
    quoted.replace('\'', "\"")
}

/// Parse a candidate, reporting which attempt succeeded.
pub fn parse_candidate_with(candidate: &str) -> Option<(RawRecord, ParseAttempt)> {
    let cleaned = candidate.replace('\0', "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return into_object(value).map(|obj| (obj, ParseAttempt::Strict));
    }

    let without_commas = strip_trailing_commas(cleaned);
    if let Ok(value) = serde_json::from_str::<Value>(&without_commas) {
        return into_object(value).map(|obj| (obj, ParseAttempt::TrailingCommas));
    }

    let repaired = best_effort_repair(&without_commas);
    serde_json::from_str::<Value>(&repaired)
        .ok()
        .and_then(into_object)
        .map(|obj| (obj, ParseAttempt::BestEffort))
}

/// Parse a candidate into a key-value mapping, or `None` if every attempt fails.
pub fn parse_candidate(candidate: &str) -> Option<RawRecord> {
    parse_candidate_with(candidate).map(|(obj, _)| obj)
}

fn into_object(value: Value) -> Option<RawRecord> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict() {
        let (obj, attempt) = parse_candidate_with(r#"{"a": 1}"#).unwrap();
        assert_eq!(attempt, ParseAttempt::Strict);
        assert_eq!(obj["a"], json!(1));
    }

    #[test]
    fn test_trailing_comma_repair() {
        let (obj, attempt) = parse_candidate_with(r#"{"a":1,}"#).unwrap();
        assert_eq!(attempt, ParseAttempt::TrailingCommas);
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["a"], json!(1));
    }

    #[test]
    fn test_trailing_comma_in_nested_array() {
        let obj = parse_candidate("{\"keywords\": [\"HLA\", \"cancer\",\n ],\n}").unwrap();
        assert_eq!(obj["keywords"], json!(["HLA", "cancer"]));
    }

    #[test]
    fn test_unquoted_keys_and_single_quotes() {
        let (obj, attempt) = parse_candidate_with("{accession: 'PXD000001', title: 'HLA ligands'}").unwrap();
        assert_eq!(attempt, ParseAttempt::BestEffort);
        assert_eq!(obj["accession"], json!("PXD000001"));
        assert_eq!(obj["title"], json!("HLA ligands"));
    }

    #[test]
    fn test_null_bytes_removed() {
        let obj = parse_candidate("{\"a\":\0 2}").unwrap();
        assert_eq!(obj["a"], json!(2));
    }

    #[test]
    fn test_hopeless_candidate() {
        assert!(parse_candidate("{\"a\": [1, 2").is_none());
        assert!(parse_candidate("not json at all").is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(parse_candidate("[1, 2, 3]").is_none());
        assert!(parse_candidate("42").is_none());
    }

    #[test]
    fn test_apostrophe_in_value_breaks_repair() {
        // Needs the repair pass (bare key), which then mangles the apostrophe.
        assert!(parse_candidate(r#"{title: "Crohn's disease"}"#).is_none());
    }

    #[test]
    fn test_best_effort_repair_output() {
        assert_eq!(best_effort_repair("{a: 1, b_2 : 'x'}"), r#"{"a": 1, "b_2" : "x"}"#);
    }
}
