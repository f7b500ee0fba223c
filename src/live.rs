//! Live PRIDE Archive queries.
//!
//! Pages are fetched one at a time through a [`PageSource`]. Pagination stops
//! at the page ceiling, at the first empty page, or at the first failed
//! request; projects collected before a failure are still returned.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classify::{Evidence, Facet, RelevanceClassifier, Tally};
use crate::normalize::{instrument_label, sanitize};
use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/pride/ws/archive/projects";
pub const DEFAULT_QUERY: &str = "immunopeptidomics cancer timsTOF cell line tissue xenograft";
pub const DEFAULT_MAX_PAGES: u32 = 20;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One project from a query page, reduced to the fields the classifier reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Project {
    pub accession: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "instrument")]
    pub instruments: Vec<String>,
    pub diseases: Vec<String>,
    pub sample: Vec<String>,
    #[serde(rename = "ftpLinks")]
    pub ftp_links: Vec<String>,
}

impl Project {
    /// Output columns, in order.
    pub const COLUMNS: [&'static str; 6] = [
        "accession",
        "title",
        "instrument",
        "diseases",
        "sample",
        "ftpLinks",
    ];

    /// Read a project object. Returns `None` for anything but an object.
    ///
    /// `sampleProcessing` may be a list or a single string.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            accession: map.get("accession").and_then(scalar_text),
            title: map.get("title").and_then(scalar_text),
            instruments: entries(map.get("instruments")),
            diseases: entries(map.get("diseases")),
            sample: entries(map.get("sampleProcessing")),
            ftp_links: entries(map.get("ftpLinks")),
        })
    }

    pub fn evidence(&self) -> Evidence {
        Evidence::new()
            .with_text(Facet::Title, self.title.as_deref().unwrap_or(""))
            .with_text(Facet::Sample, &self.sample.join(" "))
            .with_text(Facet::Diseases, &self.diseases.join(" "))
            .with_instruments(self.instruments.iter().cloned())
    }

    /// TSV row in [`Project::COLUMNS`] order; lists joined with `", "`.
    pub fn row(&self) -> Vec<String> {
        vec![
            self.accession.clone().unwrap_or_default(),
            sanitize(self.title.as_deref().unwrap_or("")),
            sanitize(&self.instruments.join(", ")),
            sanitize(&self.diseases.join(", ")),
            sanitize(&self.sample.join(", ")),
            sanitize(&self.ftp_links.join(", ")),
        ]
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn entries(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(instrument_label).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Project list from a response body: a top-level array, or the `list` key
/// of an object.
pub fn extract_projects(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("list") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Something that yields pages of project objects.
pub trait PageSource {
    /// Fetch one zero-based page.
    fn fetch_page(&mut self, page: u32) -> Result<Vec<Value>, Error>;
}

/// Query parameters and endpoint.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub base_url: String,
    pub query: String,
    pub max_pages: u32,
    pub page_size: u32,
    pub timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            query: DEFAULT_QUERY.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Blocking PRIDE Archive client.
pub struct PrideClient {
    agent: ureq::Agent,
    config: QueryConfig,
}

impl PrideClient {
    pub fn new(config: QueryConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }
}

impl PageSource for PrideClient {
    fn fetch_page(&mut self, page: u32) -> Result<Vec<Value>, Error> {
        debug!(page, url = %self.config.base_url, "requesting page");
        let response = self
            .agent
            .get(&self.config.base_url)
            .query("q", &self.config.query)
            .query("page", &page.to_string())
            .query("size", &self.config.page_size.to_string())
            .call()?;

        let body: Value = serde_json::from_reader(response.into_reader())?;
        Ok(extract_projects(body))
    }
}

/// Result of a paginated run.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    pub accepted: Vec<Project>,
    pub tally: Tally,
    pub pages_fetched: u32,
}

/// Fetch up to `max_pages` pages and keep the projects the classifier accepts.
pub fn run_query<S: PageSource>(
    source: &mut S,
    max_pages: u32,
    classifier: &RelevanceClassifier,
) -> QueryOutcome {
    let mut outcome = QueryOutcome::default();

    for page in 0..max_pages {
        let projects = match source.fetch_page(page) {
            Ok(projects) => projects,
            Err(e) => {
                warn!(page, error = %e, "stopping pagination");
                break;
            }
        };
        outcome.pages_fetched += 1;

        if projects.is_empty() {
            debug!(page, "empty page, stopping pagination");
            break;
        }

        for value in &projects {
            let Some(project) = Project::from_value(value) else {
                outcome.tally.record_parse_failure();
                continue;
            };

            let verdict = classifier.classify(&project.evidence());
            outcome.tally.record(&verdict);
            if verdict.is_accepted() {
                info!(
                    accession = project.accession.as_deref().unwrap_or(""),
                    title = project.title.as_deref().unwrap_or(""),
                    "accepted project"
                );
                outcome.accepted.push(project);
            }
        }
    }

    outcome
}
