//! Plain term-containment predicates.

use std::sync::Arc;

use crate::classify::{Evaluation, Evidence, Facet, Predicate, PredicateKind, Vocabulary};

/// Cancer vocabulary in a configurable set of facets.
///
/// The ultra-strict profile scopes this to keywords alone so that incidental
/// mentions in a title or description do not count.
pub struct DomainPredicate {
    vocabulary: Arc<Vocabulary>,
    facets: Vec<Facet>,
}

impl DomainPredicate {
    pub fn new(vocabulary: Arc<Vocabulary>, facets: &[Facet]) -> Self {
        Self {
            vocabulary,
            facets: facets.to_vec(),
        }
    }
}

impl Predicate for DomainPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Domain
    }

    fn evaluate(&self, evidence: &Evidence) -> Evaluation {
        let text = evidence.joined(&self.facets);
        match self.vocabulary.find_cancer(&text) {
            Some(term) => Evaluation::hit(term),
            None => Evaluation::miss(),
        }
    }
}

/// Specimen-type terms (cell line, tissue, xenograft).
pub struct SamplePredicate {
    vocabulary: Arc<Vocabulary>,
    facets: Vec<Facet>,
}

impl SamplePredicate {
    pub fn new(vocabulary: Arc<Vocabulary>, facets: &[Facet]) -> Self {
        Self {
            vocabulary,
            facets: facets.to_vec(),
        }
    }
}

impl Predicate for SamplePredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Sample
    }

    fn evaluate(&self, evidence: &Evidence) -> Evaluation {
        let text = evidence.joined(&self.facets);
        match self.vocabulary.find_sample_type(&text) {
            Some(term) => Evaluation::hit(term),
            None => Evaluation::miss(),
        }
    }
}
