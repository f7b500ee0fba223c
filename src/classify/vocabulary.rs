//! Term tables shared by every classifier profile.
//!
//! All matching is plain case-insensitive substring containment, except the
//! instrument patterns which are case-insensitive regexes.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::Error;

/// timsTOF family: the base name plus the named sub-models.
pub const INSTRUMENT_PATTERNS: &[&str] = &[
    r"tims-?tof",
    r"tims-?tof\s+pro",
    r"tims-?tof\s+pro\s+2",
    r"tims-?tof\s+scp",
    r"tims-?tof\s+ht",
    r"tims-?tof\s+flex",
    r"tims-?tof\s+ultra",
    r"tims-?tof\s+elite",
    r"tims-?tof\s+discovery",
];

/// Topic-defining terms.
pub const INCLUDE_TERMS: &[&str] = &[
    "immunopeptidomics",
    "immunopeptidomic",
    "immunopeptidome",
    "immunopeptide",
    "hla peptidome",
    "mhc peptidome",
    "antigen presentation",
    "peptide presentation",
    "t cell epitope",
    "cd8 epitope",
    "cd4 epitope",
    "hla class i",
    "hla class ii",
    "mhc class i",
    "mhc class ii",
    "hla-i",
    "hla-ii",
    "mhc-i",
    "mhc-ii",
    "human leukocyte antigen peptidome",
    "major histocompatibility complex peptidome",
];

/// Adjacent-domain terms that often co-occur with the topic.
pub const SECONDARY_TERMS: &[&str] = &["mhc", "hla", "major histocompatibility"];

/// The broader field the topic specializes. These only disqualify text that
/// lacks every include term.
pub const EXCLUDE_UNLESS_PRIMARY_TERMS: &[&str] = &[
    "proteomics",
    "proteomic",
    "phosphoproteomics",
    "phosphoproteomic",
    "glycoproteomics",
    "glycoproteomic",
    "acetylproteomics",
    "acetylproteomic",
    "ubiquitinomics",
    "ubiquitinomic",
    "metabolomics",
    "metabolomic",
    "lipidomics",
    "lipidomic",
    "transcriptomics",
    "transcriptomic",
    "genomics",
    "genomic",
    "epigenomics",
    "epigenomic",
    "phosphorylation",
    "glycosylation",
    "acetylation",
    "ubiquitination",
    "methylation",
    "sumoylation",
    "palmitoylation",
    "myristoylation",
    "farnesylation",
    "geranylation",
];

/// Disease-domain terms.
pub const CANCER_TERMS: &[&str] = &[
    "cancer",
    "tumour",
    "tumor",
    "malignant",
    "benign",
    "oncology",
    "neoplasm",
    "carcinoma",
    "sarcoma",
    "leukemia",
    "lymphoma",
    "melanoma",
    "glioblastoma",
    "glioma",
    "adenocarcinoma",
    "metastasis",
    "metastatic",
    "cancerous",
    "tumorous",
    "neuroblastoma",
    "oral cancer",
    "breast cancer",
    "lung cancer",
    "prostate cancer",
    "colorectal cancer",
    "pancreatic cancer",
    "ovarian cancer",
    "cervical cancer",
    "endometrial cancer",
    "thyroid cancer",
    "brain cancer",
    "bone cancer",
    "skin cancer",
    "stomach cancer",
    "esophageal cancer",
    "head and neck cancer",
    "testicular cancer",
    "adrenal cancer",
];

/// Specimen types required by the live-query profile.
pub const SAMPLE_TYPE_TERMS: &[&str] = &["cell line", "tissue", "xenograft"];

static BUILTIN: Lazy<Arc<Vocabulary>> = Lazy::new(|| {
    Arc::new(Vocabulary::new(&VocabularyConfig::default()).expect("built-in vocabulary is valid"))
});

/// Optional overrides for the built-in term tables, loaded from JSON.
///
/// Every list that is omitted keeps its built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VocabularyConfig {
    pub instrument_patterns: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub secondary: Option<Vec<String>>,
    pub exclude_unless_primary: Option<Vec<String>>,
    pub cancer: Option<Vec<String>>,
    pub sample_types: Option<Vec<String>>,
}

impl VocabularyConfig {
    /// Read overrides from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Immutable term tables, built once and shared by all predicates.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    instrument_patterns: Vec<Regex>,
    include: Vec<String>,
    secondary: Vec<String>,
    exclude_unless_primary: Vec<String>,
    cancer: Vec<String>,
    sample_types: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary, falling back to the built-in tables for any list
    /// the config leaves out.
    ///
    /// Fails on an invalid instrument pattern or when the three topic tiers
    /// share a term.
    pub fn new(config: &VocabularyConfig) -> Result<Self, Error> {
        let instrument_patterns = pick(&config.instrument_patterns, INSTRUMENT_PATTERNS)
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;

        let vocabulary = Self {
            instrument_patterns,
            include: lowered(pick(&config.include, INCLUDE_TERMS)),
            secondary: lowered(pick(&config.secondary, SECONDARY_TERMS)),
            exclude_unless_primary: lowered(pick(
                &config.exclude_unless_primary,
                EXCLUDE_UNLESS_PRIMARY_TERMS,
            )),
            cancer: lowered(pick(&config.cancer, CANCER_TERMS)),
            sample_types: lowered(pick(&config.sample_types, SAMPLE_TYPE_TERMS)),
        };

        vocabulary.check_tiers_disjoint()?;
        Ok(vocabulary)
    }

    /// The shared built-in vocabulary.
    pub fn builtin() -> Arc<Vocabulary> {
        Arc::clone(&BUILTIN)
    }

    fn check_tiers_disjoint(&self) -> Result<(), Error> {
        let tiers = [
            ("include", &self.include),
            ("secondary", &self.secondary),
            ("exclude_unless_primary", &self.exclude_unless_primary),
        ];
        for (i, (name_a, terms_a)) in tiers.iter().enumerate() {
            for (name_b, terms_b) in &tiers[i + 1..] {
                if let Some(term) = terms_a.iter().find(|t| terms_b.contains(*t)) {
                    return Err(Error::Vocabulary(format!(
                        "term '{}' appears in both {} and {}",
                        term, name_a, name_b
                    )));
                }
            }
        }
        Ok(())
    }

    /// First instrument pattern matching `text`, if any.
    pub fn match_instrument(&self, text: &str) -> Option<&Regex> {
        self.instrument_patterns.iter().find(|p| p.is_match(text))
    }

    /// First include term contained in already lower-cased `text`.
    pub fn find_include(&self, text: &str) -> Option<&str> {
        find_term(&self.include, text)
    }

    /// First secondary term contained in already lower-cased `text`.
    pub fn find_secondary(&self, text: &str) -> Option<&str> {
        find_term(&self.secondary, text)
    }

    /// First exclude-unless-primary term contained in already lower-cased `text`.
    pub fn find_exclusion(&self, text: &str) -> Option<&str> {
        find_term(&self.exclude_unless_primary, text)
    }

    /// First cancer term contained in already lower-cased `text`.
    pub fn find_cancer(&self, text: &str) -> Option<&str> {
        find_term(&self.cancer, text)
    }

    /// First sample-type term contained in already lower-cased `text`.
    pub fn find_sample_type(&self, text: &str) -> Option<&str> {
        find_term(&self.sample_types, text)
    }

    /// Human-readable listing of every tier and the include/exclude logic.
    ///
    /// Which fields each tier is searched in depends on the profile; see
    /// `Profile::scope`.
    pub fn describe(&self) -> String {
        fn section(out: &mut String, title: &str, terms: &[String]) {
            let _ = writeln!(out, "\n{}:", title);
            for term in terms {
                let _ = writeln!(out, "  - {}", term);
            }
        }

        let mut out = String::new();

        let patterns: Vec<String> = self
            .instrument_patterns
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        section(&mut out, "Instrument patterns (case-insensitive)", &patterns);
        section(&mut out, "Immunopeptidomics terms", &self.include);
        section(&mut out, "Secondary terms", &self.secondary);
        section(&mut out, "Cancer terms", &self.cancer);
        section(&mut out, "Sample types", &self.sample_types);

        out.push_str("\nLogic for other omics terms:\n");
        out.push_str("  - immunopeptidomics AND other omics -> ACCEPT\n");
        out.push_str("  - other omics only (no immunopeptidomics) -> REJECT\n");
        out.push_str("  - immunopeptidomics only -> ACCEPT\n");
        section(
            &mut out,
            "Other omics terms (allowed when immunopeptidomics is also present)",
            &self.exclude_unless_primary,
        );

        out
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        (*Self::builtin()).clone()
    }
}

fn pick<'a>(custom: &'a Option<Vec<String>>, builtin: &'a [&'static str]) -> Vec<&'a str> {
    match custom {
        Some(terms) => terms.iter().map(String::as_str).collect(),
        None => builtin.to_vec(),
    }
}

fn lowered(terms: Vec<&str>) -> Vec<String> {
    terms.into_iter().map(str::to_lowercase).collect()
}

fn find_term<'a>(terms: &'a [String], text: &str) -> Option<&'a str> {
    terms
        .iter()
        .find(|term| text.contains(term.as_str()))
        .map(String::as_str)
}
