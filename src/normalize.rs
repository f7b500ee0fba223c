//! Maps varying source keys onto the canonical fields.
//!
//! Each canonical field has an ordered alias list; the first alias present
//! with a non-empty value wins and the rest are ignored. Values are
//! flattened to single-line text so they can go straight into a TSV cell.

use serde_json::{Map, Value};

use crate::{Field, RawRecord, Record};

/// Canonical field to ordered source-key aliases.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(Field, Vec<String>)>,
}

impl AliasTable {
    /// Create an empty table (no aliases for any field).
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replace the alias list of one field.
    pub fn with_aliases(mut self, field: Field, aliases: &[&str]) -> Self {
        let aliases: Vec<String> = aliases.iter().map(|a| a.to_string()).collect();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = aliases,
            None => self.entries.push((field, aliases)),
        }
        self
    }

    /// Aliases for a field, in priority order.
    pub fn aliases(&self, field: Field) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a source key is an alias of any canonical field.
    pub fn is_alias(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, aliases)| aliases.iter().any(|a| a == key))
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new()
            .with_aliases(Field::Accession, &["accession", "id", "dataset_id", "pride_id"])
            .with_aliases(Field::Title, &["title", "dataset_title", "name"])
            .with_aliases(
                Field::ProjectDescription,
                &["description", "project_description", "summary", "projectDescription"],
            )
            .with_aliases(Field::Keywords, &["keywords", "tags"])
            .with_aliases(Field::Instruments, &["instruments", "instrument", "ms_instrument"])
            .with_aliases(
                Field::SubmissionDate,
                &["submission_date", "submitted", "date_submitted", "submissionDate"],
            )
            .with_aliases(
                Field::PublicationDate,
                &["publication_date", "published", "date_published", "publicationDate"],
            )
            .with_aliases(Field::Doi, &["doi", "publication_doi"])
            .with_aliases(Field::Submitters, &["submitters", "authors", "contact"])
    }
}

/// Builds canonical [`Record`]s from raw source records.
#[derive(Debug, Clone, Default)]
pub struct FieldNormalizer {
    aliases: AliasTable,
}

impl FieldNormalizer {
    /// Create a normalizer with a custom alias table.
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Normalize one raw record.
    pub fn normalize(&self, raw: &RawRecord) -> Record {
        let mut record = Record::new();

        for field in Field::ALL {
            let winner = self
                .aliases
                .aliases(field)
                .iter()
                .filter_map(|alias| raw.get(alias))
                .find(|value| is_populated(value));

            if let Some(value) = winner {
                record = record.with(field, render_value(value, Some(field)));
            }
        }

        for (key, value) in raw {
            if !self.aliases.is_alias(key) {
                record = record.with_extra(key.clone(), render_value(value, None));
            }
        }

        record
    }
}

/// Flatten a JSON value to single-line text.
///
/// Lists get field-specific handling: instrument entries contribute a display
/// name, submitter entries a "first last" name, anything else is joined with
/// `"; "`.
pub fn render_value(value: &Value, field: Option<Field>) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = match field {
                Some(Field::Instruments) => items.iter().filter_map(instrument_label).collect(),
                Some(Field::Submitters) => items.iter().filter_map(submitter_label).collect(),
                _ => items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(item_text)
                    .collect(),
            };
            parts
                .into_iter()
                .filter(|part| !part.trim().is_empty())
                .collect::<Vec<_>>()
                .join("; ")
        }
        Value::Object(map) => match map.get("name").or_else(|| map.get("title")) {
            Some(inner) => item_text(inner),
            None => value.to_string(),
        },
        other => other.to_string(),
    };

    sanitize(&text)
}

/// Display name of one instrument entry: `name`, then `accession`, then the
/// raw string.
///
/// Null or empty sub-fields are skipped, so `{"name": null, "accession": "MS:1"}`
/// yields `MS:1`.
pub fn instrument_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            populated_text(map, "name").or_else(|| populated_text(map, "accession"))
        }
        _ => None,
    }
}

fn submitter_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            let parts: Vec<String> = ["firstName", "lastName"]
                .iter()
                .filter_map(|key| populated_text(map, key))
                .collect();
            if !parts.is_empty() {
                Some(parts.join(" "))
            } else {
                populated_text(map, "name")
            }
        }
        _ => None,
    }
}

/// Text of `map[key]` when it is present and populated.
fn populated_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .filter(|value| is_populated(value))
        .map(item_text)
        .filter(|text| !text.trim().is_empty())
}

fn item_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace tabs and line breaks with spaces and trim.
pub fn sanitize(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ").trim().to_string()
}

/// Whether a value counts as present for alias resolution.
fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_alias_priority() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "dataset_title": "second choice",
            "title": "first choice",
        })));
        assert_eq!(record.get(Field::Title), "first choice");
    }

    #[test]
    fn test_empty_alias_falls_through() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "accession": "",
            "id": null,
            "dataset_id": "PXD012345",
        })));
        assert_eq!(record.get(Field::Accession), "PXD012345");
    }

    #[test]
    fn test_instruments_from_objects() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "instruments": [
                {"accession": "MS:1003005", "name": "timsTOF Pro"},
                {"accession": "MS:1001911"},
                "Q Exactive",
                42
            ]
        })));
        assert_eq!(record.get(Field::Instruments), "timsTOF Pro; MS:1001911; Q Exactive");
    }

    #[test]
    fn test_submitters() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "submitters": [
                {"firstName": "Ada", "lastName": "Lovelace"},
                {"name": "Core Facility"},
                {"lastName": "Curie"},
                "J. Doe"
            ]
        })));
        assert_eq!(
            record.get(Field::Submitters),
            "Ada Lovelace; Core Facility; Curie; J. Doe"
        );
    }

    #[test]
    fn test_null_and_empty_sub_fields_fall_back() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "submitters": [
                {"firstName": null, "lastName": "Curie"},
                {"firstName": "", "lastName": "", "name": "Core"},
                {"firstName": "", "name": null}
            ],
            "instruments": [
                {"name": null, "accession": "MS:1003005"},
                {"name": "", "accession": ""},
                ""
            ]
        })));
        assert_eq!(record.get(Field::Submitters), "Curie; Core");
        assert_eq!(record.get(Field::Instruments), "MS:1003005");
    }

    #[test]
    fn test_instrument_label_skips_empty() {
        assert_eq!(
            instrument_label(&json!({"name": null, "accession": "MS:1003005"})).as_deref(),
            Some("MS:1003005")
        );
        assert_eq!(instrument_label(&json!({"name": ""})), None);
        assert_eq!(instrument_label(&json!("")), None);
    }

    #[test]
    fn test_empty_list_entries_not_joined() {
        assert_eq!(
            render_value(&json!(["HLA", "", null, "  ", "tumor"]), None),
            "HLA; tumor"
        );
    }

    #[test]
    fn test_keywords_joined() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "keywords": ["Immunopeptidomics", "HLA", 7]
        })));
        assert_eq!(record.get(Field::Keywords), "Immunopeptidomics; HLA; 7");
    }

    #[test]
    fn test_control_characters_replaced() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "description": "  first line\nsecond\tcolumn\r\n"
        })));
        assert_eq!(record.get(Field::ProjectDescription), "first line second column");
    }

    #[test]
    fn test_unknown_keys_preserved_verbatim() {
        let normalizer = FieldNormalizer::default();
        let record = normalizer.normalize(&raw(json!({
            "title": "x",
            "projectTags": ["Biomedical"],
            "name": "ignored alias",
        })));
        assert_eq!(record.extras(), &[("projectTags".to_string(), "Biomedical".to_string())]);
        assert_eq!(record.get(Field::Title), "x");
    }

    #[test]
    fn test_object_value_uses_name() {
        assert_eq!(render_value(&json!({"name": "Bruker"}), None), "Bruker");
        assert_eq!(render_value(&json!({"title": "T"}), None), "T");
        assert_eq!(render_value(&json!({"x": 1}), None), r#"{"x":1}"#);
    }

    #[test]
    fn test_custom_alias_table() {
        let table = AliasTable::new().with_aliases(Field::Title, &["headline"]);
        let normalizer = FieldNormalizer::new(table);
        let record = normalizer.normalize(&raw(json!({"headline": "H", "title": "T"})));
        assert_eq!(record.get(Field::Title), "H");
        assert_eq!(record.column("title"), "H");
        assert!(normalizer.aliases().is_alias("headline"));
        assert!(!normalizer.aliases().is_alias("title"));
    }

    #[test]
    fn test_is_populated() {
        assert!(!is_populated(&json!(null)));
        assert!(!is_populated(&json!("")));
        assert!(!is_populated(&json!([])));
        assert!(!is_populated(&json!({})));
        assert!(!is_populated(&json!(0)));
        assert!(!is_populated(&json!(false)));
        assert!(is_populated(&json!("x")));
    }
}
