//! Canonical dataset records.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// A source record before normalization: arbitrary keys as found in a JSON
/// object or a table row.
pub type RawRecord = Map<String, Value>;

/// The nine canonical fields every source format is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Accession,
    Title,
    ProjectDescription,
    Keywords,
    Instruments,
    SubmissionDate,
    PublicationDate,
    Doi,
    Submitters,
}

impl Field {
    /// All canonical fields, in output column order.
    pub const ALL: [Field; 9] = [
        Field::Accession,
        Field::Title,
        Field::ProjectDescription,
        Field::Keywords,
        Field::Instruments,
        Field::SubmissionDate,
        Field::PublicationDate,
        Field::Doi,
        Field::Submitters,
    ];

    /// Get the canonical column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Accession => "accession",
            Field::Title => "title",
            Field::ProjectDescription => "projectDescription",
            Field::Keywords => "keywords",
            Field::Instruments => "instruments",
            Field::SubmissionDate => "submissionDate",
            Field::PublicationDate => "publicationDate",
            Field::Doi => "doi",
            Field::Submitters => "submitters",
        }
    }

    /// Parse from a canonical column name (case-sensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        Field::ALL.iter().copied().find(|f| f.as_str() == s)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized dataset.
///
/// Canonical values are flattened, delimiter-safe text. Source keys that are
/// not aliases of any canonical field are carried in `extras` under their
/// original names and are never consulted by the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<Field, String>,
    extras: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a canonical field.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Attach a non-canonical source field.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.push((name.into(), value.into()));
        self
    }

    /// Value of a canonical field, or `""` when absent.
    pub fn get(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Whether a canonical field holds a non-empty value.
    pub fn has(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    /// Non-canonical source fields, in source order.
    pub fn extras(&self) -> &[(String, String)] {
        &self.extras
    }

    /// Look up a column by name: canonical fields first, then extras.
    pub fn column(&self, name: &str) -> &str {
        if let Some(field) = Field::from_str(name) {
            return self.get(field);
        }
        self.extras
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trip_names() {
        for field in Field::ALL {
            assert_eq!(Field::from_str(field.as_str()), Some(field));
        }
        assert_eq!(Field::from_str("Title"), None);
    }

    #[test]
    fn test_missing_field_is_empty() {
        let record = Record::new().with(Field::Title, "HLA peptidome");
        assert_eq!(record.get(Field::Title), "HLA peptidome");
        assert_eq!(record.get(Field::Keywords), "");
        assert!(!record.has(Field::Keywords));
    }

    #[test]
    fn test_column_prefers_canonical_then_extras() {
        let record = Record::new()
            .with(Field::Doi, "10.1/abc")
            .with_extra("projectTags", "Biomedical");
        assert_eq!(record.column("doi"), "10.1/abc");
        assert_eq!(record.column("projectTags"), "Biomedical");
        assert_eq!(record.column("nope"), "");
    }
}
