//! Two-tier topical keyword policy.
//!
//! 1. The combined text must contain an include term, or the record is rejected.
//! 2. The same text is searched for exclude-unless-primary terms. A hit is
//!    recorded, but step 1 already established the primary topic, so the
//!    record is accepted either way.
//!
//! Step 2 can therefore never reject on its own. That permissiveness is kept
//! as-is; the exclusion hit is still surfaced for reporting.

use std::sync::Arc;

use crate::classify::{Evaluation, Evidence, Facet, Predicate, PredicateKind, Vocabulary};

/// Which term tiers count as the primary topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicTier {
    /// Include terms only.
    Primary,
    /// Include terms, then secondary terms.
    PrimaryAndSecondary,
}

pub struct TopicPredicate {
    vocabulary: Arc<Vocabulary>,
    facets: Vec<Facet>,
    tier: TopicTier,
}

impl TopicPredicate {
    pub fn new(vocabulary: Arc<Vocabulary>, facets: &[Facet], tier: TopicTier) -> Self {
        Self {
            vocabulary,
            facets: facets.to_vec(),
            tier,
        }
    }
}

impl Predicate for TopicPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Topic
    }

    fn evaluate(&self, evidence: &Evidence) -> Evaluation {
        let text = evidence.joined(&self.facets);

        let primary = match self.tier {
            TopicTier::Primary => self.vocabulary.find_include(&text),
            TopicTier::PrimaryAndSecondary => self
                .vocabulary
                .find_include(&text)
                .or_else(|| self.vocabulary.find_secondary(&text)),
        };
        let exclusion_hit = self.vocabulary.find_exclusion(&text).is_some();

        match primary {
            Some(term) => Evaluation::hit(term).with_exclusion(exclusion_hit),
            None => Evaluation::miss().with_exclusion(exclusion_hit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACETS: &[Facet] = &[Facet::Title, Facet::Description, Facet::Keywords];

    fn strict() -> TopicPredicate {
        TopicPredicate::new(Vocabulary::builtin(), FACETS, TopicTier::Primary)
    }

    fn evidence(title: &str, description: &str, keywords: &str) -> Evidence {
        Evidence::new()
            .with_text(Facet::Title, title)
            .with_text(Facet::Description, description)
            .with_text(Facet::Keywords, keywords)
    }

    #[test]
    fn test_include_required() {
        let result = strict().evaluate(&evidence("Plasma proteome", "", "proteomics"));
        assert!(!result.matched);
        assert!(result.exclusion_hit);
    }

    #[test]
    fn test_include_with_exclusion_still_accepted() {
        let result = strict().evaluate(&evidence(
            "Immunopeptidomics and phosphoproteomics of melanoma",
            "",
            "",
        ));
        assert!(result.matched);
        assert!(result.exclusion_hit);
        assert_eq!(result.term.as_deref(), Some("immunopeptidomics"));
    }

    #[test]
    fn test_pure_topic() {
        let result = strict().evaluate(&evidence("", "we profiled the HLA class I ligandome", ""));
        assert!(result.matched);
        assert!(!result.exclusion_hit);
    }

    #[test]
    fn test_any_field_counts() {
        assert!(strict().evaluate(&evidence("", "", "Immunopeptidome")).matched);
        assert!(strict().evaluate(&evidence("MHC-II ligands", "", "")).matched);
    }

    #[test]
    fn test_secondary_only_counts_in_broad_tier() {
        let broad = TopicPredicate::new(Vocabulary::builtin(), FACETS, TopicTier::PrimaryAndSecondary);
        let e = evidence("HLA typing of donors", "", "");
        assert!(!strict().evaluate(&e).matched);
        assert!(broad.evaluate(&e).matched);
    }

    #[test]
    fn test_idempotent() {
        let predicate = strict();
        let e = evidence("immunopeptidome", "glycosylation", "cancer");
        assert_eq!(predicate.evaluate(&e), predicate.evaluate(&e));
    }
}
