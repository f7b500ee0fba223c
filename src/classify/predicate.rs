//! Predicate trait and related types.

use std::fmt;

use super::Evidence;

/// Which criterion a predicate implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Instrument,
    Topic,
    Domain,
    Sample,
}

impl PredicateKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Instrument => "instrument",
            PredicateKind::Topic => "topic",
            PredicateKind::Domain => "domain",
            PredicateKind::Sample => "sample",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one predicate on one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether the criterion is satisfied.
    pub matched: bool,
    /// Whether an exclude-unless-primary term was seen (topic only).
    pub exclusion_hit: bool,
    /// The term or instrument entry that satisfied the criterion.
    pub term: Option<String>,
}

impl Evaluation {
    /// A satisfied criterion.
    pub fn hit(term: impl Into<String>) -> Self {
        Self {
            matched: true,
            exclusion_hit: false,
            term: Some(term.into()),
        }
    }

    /// An unsatisfied criterion.
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn with_exclusion(mut self, exclusion_hit: bool) -> Self {
        self.exclusion_hit = exclusion_hit;
        self
    }
}

/// A single relevance criterion.
///
/// Predicates are pure: evaluating the same evidence twice gives the same
/// result, and evidence is never modified.
pub trait Predicate: Send + Sync {
    /// The criterion this predicate implements.
    fn kind(&self) -> PredicateKind;

    /// Evaluate the criterion.
    fn evaluate(&self, evidence: &Evidence) -> Evaluation;
}
