//! Verdicts and run-wide counters.

use tracing::info;

use super::{Evaluation, PredicateKind};

/// Per-criterion outcomes for one record plus the combined decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    results: Vec<(PredicateKind, Evaluation)>,
    accepted: bool,
}

impl Verdict {
    /// Combine evaluations with logical AND. No evaluations means accept.
    pub fn new(results: Vec<(PredicateKind, Evaluation)>) -> Self {
        let accepted = results.iter().all(|(_, evaluation)| evaluation.matched);
        Self { results, accepted }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Outcome of the given criterion, or `None` if it was not evaluated.
    pub fn matched(&self, kind: PredicateKind) -> Option<bool> {
        self.evaluation(kind).map(|evaluation| evaluation.matched)
    }

    /// The term that satisfied the given criterion.
    pub fn term(&self, kind: PredicateKind) -> Option<&str> {
        self.evaluation(kind)
            .and_then(|evaluation| evaluation.term.as_deref())
    }

    /// Whether any predicate saw an exclude-unless-primary term.
    pub fn exclusion_hit(&self) -> bool {
        self.results
            .iter()
            .any(|(_, evaluation)| evaluation.exclusion_hit)
    }

    pub fn results(&self) -> &[(PredicateKind, Evaluation)] {
        &self.results
    }

    fn evaluation(&self, kind: PredicateKind) -> Option<&Evaluation> {
        self.results
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, evaluation)| evaluation)
    }
}

/// Counters accumulated over one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub parse_failures: usize,
    pub instrument: usize,
    pub topic: usize,
    pub domain: usize,
    pub sample: usize,
    pub exclusions: usize,
    pub accepted: usize,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one classified record.
    pub fn record(&mut self, verdict: &Verdict) {
        self.total += 1;
        for (kind, evaluation) in verdict.results() {
            if evaluation.matched {
                match kind {
                    PredicateKind::Instrument => self.instrument += 1,
                    PredicateKind::Topic => self.topic += 1,
                    PredicateKind::Domain => self.domain += 1,
                    PredicateKind::Sample => self.sample += 1,
                }
            }
        }
        if verdict.exclusion_hit() {
            self.exclusions += 1;
        }
        if verdict.is_accepted() {
            self.accepted += 1;
        }
    }

    /// Count one candidate that could not be parsed into a record.
    pub fn record_parse_failure(&mut self) {
        self.parse_failures += 1;
    }

    /// Emit the summary as one structured event.
    pub fn log_summary(&self, label: &str) {
        info!(
            run = label,
            total = self.total,
            parse_failures = self.parse_failures,
            instrument = self.instrument,
            topic = self.topic,
            domain = self.domain,
            sample = self.sample,
            exclusions = self.exclusions,
            accepted = self.accepted,
            "classification summary"
        );
    }
}
