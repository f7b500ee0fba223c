//! Relevance classification.
//!
//! A classifier holds a list of predicates and accepts a record only when
//! every predicate matches. All predicates are always evaluated so the
//! per-criterion counters stay complete.
//!
//! # Example
//!
//! ```
//! use pridesift::classify::{Evidence, Facet, RelevanceClassifier};
//!
//! let classifier = RelevanceClassifier::ultra_strict();
//!
//! let evidence = Evidence::new()
//!     .with_text(Facet::Title, "HLA peptidome study")
//!     .with_text(Facet::Keywords, "immunopeptidomics; breast cancer")
//!     .with_instruments(["timsTOF Pro 2"]);
//!
//! assert!(classifier.classify(&evidence).is_accepted());
//! ```

mod evidence;
mod predicate;
pub mod predicates;
mod types;
mod vocabulary;

pub use evidence::{Evidence, Facet};
pub use predicate::{Evaluation, Predicate, PredicateKind};
pub use predicates::{
    DomainPredicate, InstrumentPredicate, SamplePredicate, TopicPredicate, TopicTier,
};
pub use types::{Tally, Verdict};
pub use vocabulary::{Vocabulary, VocabularyConfig};

use std::fmt;
use std::sync::Arc;

use crate::Record;

/// Bulk and live fields searched for topic terms.
const BULK_TEXT: &[Facet] = &[Facet::Title, Facet::Description, Facet::Keywords];
const LIVE_TEXT: &[Facet] = &[Facet::Title, Facet::Sample, Facet::Diseases];

/// Predicate compositions used by the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Bulk filter: cancer terms must come from keywords.
    UltraStrict,
    /// Bulk screen: secondary terms count, instrument may appear in free text.
    Broad,
    /// Live query: requires a specimen-type term.
    LiveQuery,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::UltraStrict => "ultra-strict",
            Profile::Broad => "broad",
            Profile::LiveQuery => "live-query",
        }
    }

    /// Which fields each criterion searches under this profile.
    pub fn scope(&self) -> &'static str {
        match self {
            Profile::UltraStrict => {
                "Instrument: instruments field\n\
                 Immunopeptidomics terms: title, description, keywords\n\
                 Cancer terms: keywords field only\n"
            }
            Profile::Broad => {
                "Instrument: instruments field, else title and description\n\
                 Immunopeptidomics or secondary terms: title, description, keywords\n\
                 Cancer terms: title, description, keywords\n"
            }
            Profile::LiveQuery => {
                "Instrument: each instrument entry\n\
                 Immunopeptidomics terms: title, sample, diseases\n\
                 Cancer terms: title, sample, diseases\n\
                 Sample types: sample processing only\n"
            }
        }
    }

    /// Build this profile's predicates over a shared vocabulary.
    pub fn predicates(&self, vocabulary: Arc<Vocabulary>) -> Vec<Box<dyn Predicate>> {
        match self {
            Profile::UltraStrict => vec![
                Box::new(InstrumentPredicate::new(Arc::clone(&vocabulary))),
                Box::new(TopicPredicate::new(
                    Arc::clone(&vocabulary),
                    BULK_TEXT,
                    TopicTier::Primary,
                )),
                Box::new(DomainPredicate::new(vocabulary, &[Facet::Keywords])),
            ],
            Profile::Broad => vec![
                Box::new(
                    InstrumentPredicate::new(Arc::clone(&vocabulary))
                        .with_fallback(&[Facet::Title, Facet::Description]),
                ),
                Box::new(TopicPredicate::new(
                    Arc::clone(&vocabulary),
                    BULK_TEXT,
                    TopicTier::PrimaryAndSecondary,
                )),
                Box::new(DomainPredicate::new(vocabulary, BULK_TEXT)),
            ],
            Profile::LiveQuery => vec![
                Box::new(InstrumentPredicate::new(Arc::clone(&vocabulary))),
                Box::new(TopicPredicate::new(
                    Arc::clone(&vocabulary),
                    LIVE_TEXT,
                    TopicTier::Primary,
                )),
                Box::new(DomainPredicate::new(Arc::clone(&vocabulary), LIVE_TEXT)),
                Box::new(SamplePredicate::new(vocabulary, &[Facet::Sample])),
            ],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts a record when every predicate matches.
pub struct RelevanceClassifier {
    predicates: Vec<Box<dyn Predicate>>,
}

impl RelevanceClassifier {
    /// Create a classifier with no predicates (accepts everything).
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Create a classifier with the given predicates.
    pub fn with_predicates(predicates: Vec<Box<dyn Predicate>>) -> Self {
        Self { predicates }
    }

    /// Add a predicate.
    pub fn add_predicate<P: Predicate + 'static>(&mut self, predicate: P) {
        self.predicates.push(Box::new(predicate));
    }

    /// Create a classifier for a profile over the given vocabulary.
    pub fn for_profile(profile: Profile, vocabulary: Arc<Vocabulary>) -> Self {
        Self::with_predicates(profile.predicates(vocabulary))
    }

    pub fn ultra_strict() -> Self {
        Self::for_profile(Profile::UltraStrict, Vocabulary::builtin())
    }

    pub fn broad() -> Self {
        Self::for_profile(Profile::Broad, Vocabulary::builtin())
    }

    pub fn live_query() -> Self {
        Self::for_profile(Profile::LiveQuery, Vocabulary::builtin())
    }

    /// Evaluate every predicate and combine with logical AND.
    pub fn classify(&self, evidence: &Evidence) -> Verdict {
        let results = self
            .predicates
            .iter()
            .map(|predicate| (predicate.kind(), predicate.evaluate(evidence)))
            .collect();
        Verdict::new(results)
    }

    /// Classify a normalized bulk record.
    pub fn classify_record(&self, record: &Record) -> Verdict {
        self.classify(&Evidence::from_record(record))
    }

    /// Get the number of predicates.
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }
}

impl Default for RelevanceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn bulk(instruments: &str, title: &str, description: &str, keywords: &str) -> Record {
        Record::new()
            .with(Field::Accession, "PXD000001")
            .with(Field::Instruments, instruments)
            .with(Field::Title, title)
            .with(Field::ProjectDescription, description)
            .with(Field::Keywords, keywords)
    }

    fn live(title: &str, diseases: &str, sample: &str, instruments: &[&str]) -> Evidence {
        Evidence::new()
            .with_text(Facet::Title, title)
            .with_text(Facet::Diseases, diseases)
            .with_text(Facet::Sample, sample)
            .with_instruments(instruments.iter().copied())
    }

    #[test]
    fn test_empty_classifier_accepts() {
        let classifier = RelevanceClassifier::new();
        assert_eq!(classifier.predicate_count(), 0);
        assert!(classifier.classify(&Evidence::new()).is_accepted());
    }

    #[test]
    fn test_profile_sizes() {
        assert_eq!(RelevanceClassifier::ultra_strict().predicate_count(), 3);
        assert_eq!(RelevanceClassifier::broad().predicate_count(), 3);
        assert_eq!(RelevanceClassifier::live_query().predicate_count(), 4);
    }

    #[test]
    fn test_scope_matches_profile() {
        assert!(Profile::UltraStrict.scope().contains("Cancer terms: keywords field only"));
        assert!(Profile::Broad
            .scope()
            .contains("Cancer terms: title, description, keywords"));
        assert!(Profile::LiveQuery.scope().contains("Sample types"));
        assert!(!Profile::Broad.scope().contains("Sample types"));
    }

    #[test]
    fn test_every_predicate_evaluated() {
        let classifier = RelevanceClassifier::ultra_strict();
        let verdict = classifier.classify_record(&bulk("Orbitrap", "", "", "melanoma"));
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.matched(PredicateKind::Instrument), Some(false));
        assert_eq!(verdict.matched(PredicateKind::Topic), Some(false));
        assert_eq!(verdict.matched(PredicateKind::Domain), Some(true));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = RelevanceClassifier::ultra_strict();
        let record = bulk(
            "timsTOF Pro",
            "HLA class I ligands",
            "phosphoproteomics companion",
            "tumor",
        );
        let first = classifier.classify_record(&record);
        let second = classifier.classify_record(&record);
        assert_eq!(first, second);
        assert!(first.is_accepted());
    }

    #[test]
    fn test_include_term_wins_over_exclusion() {
        let classifier = RelevanceClassifier::ultra_strict();
        let record = bulk(
            "timsTOF SCP",
            "Immunopeptidomics and proteomics of lung tissue",
            "glycoproteomics, acetylation",
            "lung cancer",
        );
        let verdict = classifier.classify_record(&record);
        assert!(verdict.is_accepted());
        assert!(verdict.exclusion_hit());

        let without_include = bulk(
            "timsTOF SCP",
            "Proteomics of lung tissue",
            "glycoproteomics",
            "lung cancer",
        );
        assert!(!classifier.classify_record(&without_include).is_accepted());
    }

    #[test]
    fn test_empty_keywords_never_satisfy_domain() {
        let classifier = RelevanceClassifier::ultra_strict();
        let record = bulk(
            "timsTOF Pro",
            "Melanoma immunopeptidome",
            "tumor biopsies from cancer patients",
            "",
        );
        let verdict = classifier.classify_record(&record);
        assert_eq!(verdict.matched(PredicateKind::Domain), Some(false));
        assert!(!verdict.is_accepted());
    }

    #[test]
    fn test_broad_profile_is_looser() {
        let record = bulk(
            "",
            "HLA ligands measured on timsTOF HT",
            "colorectal carcinoma organoids",
            "",
        );
        assert!(!RelevanceClassifier::ultra_strict()
            .classify_record(&record)
            .is_accepted());
        assert!(RelevanceClassifier::broad()
            .classify_record(&record)
            .is_accepted());
    }

    #[test]
    fn test_live_project_with_sample_type() {
        let classifier = RelevanceClassifier::live_query();
        let accepted = live(
            "immunopeptidomics cancer study",
            "Melanoma",
            "xenograft model",
            &["timsTOF Pro"],
        );
        let verdict = classifier.classify(&accepted);
        assert!(verdict.is_accepted());
        assert_eq!(verdict.term(PredicateKind::Sample), Some("xenograft"));

        let rejected = live(
            "immunopeptidomics cancer study",
            "Melanoma",
            "plasma digestion",
            &["timsTOF Pro"],
        );
        let verdict = classifier.classify(&rejected);
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.matched(PredicateKind::Sample), Some(false));
    }

    #[test]
    fn test_substitute_vocabulary() {
        let config = VocabularyConfig {
            include: Some(vec!["neoantigen".to_string()]),
            ..Default::default()
        };
        let vocabulary = Arc::new(Vocabulary::new(&config).unwrap());
        let classifier = RelevanceClassifier::for_profile(Profile::UltraStrict, vocabulary);
        let record = bulk("timsTOF", "Neoantigen discovery", "", "carcinoma");
        assert!(classifier.classify_record(&record).is_accepted());
    }

    #[test]
    fn test_custom_predicate() {
        struct Never;

        impl Predicate for Never {
            fn kind(&self) -> PredicateKind {
                PredicateKind::Sample
            }

            fn evaluate(&self, _evidence: &Evidence) -> Evaluation {
                Evaluation::miss()
            }
        }

        let mut classifier = RelevanceClassifier::ultra_strict();
        classifier.add_predicate(Never);
        let record = bulk("timsTOF Pro 2", "HLA peptidome study", "", "breast cancer");
        assert!(!classifier.classify_record(&record).is_accepted());
    }
}
