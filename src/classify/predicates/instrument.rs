//! Instrument family matching.

use std::sync::Arc;

use crate::classify::{Evaluation, Evidence, Facet, Predicate, PredicateKind, Vocabulary};

/// Matches any instrument pattern against each instrument entry.
///
/// With fallback facets configured, a record whose instrument entries do not
/// match is also accepted if the pattern appears in those facets instead.
pub struct InstrumentPredicate {
    vocabulary: Arc<Vocabulary>,
    fallback: Vec<Facet>,
}

impl InstrumentPredicate {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            fallback: Vec::new(),
        }
    }

    /// Also search these facets when no instrument entry matches.
    pub fn with_fallback(mut self, facets: &[Facet]) -> Self {
        self.fallback = facets.to_vec();
        self
    }
}

impl Predicate for InstrumentPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Instrument
    }

    fn evaluate(&self, evidence: &Evidence) -> Evaluation {
        for entry in evidence.instruments() {
            if self.vocabulary.match_instrument(entry).is_some() {
                return Evaluation::hit(entry.clone());
            }
        }

        for facet in &self.fallback {
            if let Some(pattern) = self.vocabulary.match_instrument(evidence.text(*facet)) {
                return Evaluation::hit(format!("{} ({})", pattern.as_str(), facet.as_str()));
            }
        }

        Evaluation::miss()
    }
}
