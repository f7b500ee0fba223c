//! The text a classifier looks at for one record.

use crate::{Field, Record};

/// A searchable text facet of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Title,
    Description,
    Keywords,
    Diseases,
    Sample,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Title => "title",
            Facet::Description => "description",
            Facet::Keywords => "keywords",
            Facet::Diseases => "diseases",
            Facet::Sample => "sample",
        }
    }
}

/// Lower-cased text facets plus the instrument entries of one dataset.
///
/// Instruments keep their original case; instrument patterns are matched
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    title: String,
    description: String,
    keywords: String,
    diseases: String,
    sample: String,
    instruments: Vec<String>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one text facet (lower-cased on the way in).
    pub fn with_text(mut self, facet: Facet, text: &str) -> Self {
        let text = text.to_lowercase();
        match facet {
            Facet::Title => self.title = text,
            Facet::Description => self.description = text,
            Facet::Keywords => self.keywords = text,
            Facet::Diseases => self.diseases = text,
            Facet::Sample => self.sample = text,
        }
        self
    }

    /// Set the instrument entries.
    pub fn with_instruments<I, S>(mut self, instruments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instruments = instruments.into_iter().map(Into::into).collect();
        self
    }

    /// Evidence for a normalized bulk record.
    ///
    /// The flattened instruments field is matched as one entry.
    pub fn from_record(record: &Record) -> Self {
        let instruments = if record.has(Field::Instruments) {
            vec![record.get(Field::Instruments).to_string()]
        } else {
            Vec::new()
        };

        Self::new()
            .with_text(Facet::Title, record.get(Field::Title))
            .with_text(Facet::Description, record.get(Field::ProjectDescription))
            .with_text(Facet::Keywords, record.get(Field::Keywords))
            .with_instruments(instruments)
    }

    pub fn text(&self, facet: Facet) -> &str {
        match facet {
            Facet::Title => &self.title,
            Facet::Description => &self.description,
            Facet::Keywords => &self.keywords,
            Facet::Diseases => &self.diseases,
            Facet::Sample => &self.sample,
        }
    }

    /// Facets concatenated in the given order, space-separated.
    pub fn joined(&self, facets: &[Facet]) -> String {
        facets
            .iter()
            .map(|facet| self.text(*facet))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }
}
