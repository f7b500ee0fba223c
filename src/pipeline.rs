//! End-to-end runs: stream conversion, bulk filtering, live queries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::classify::{RelevanceClassifier, Tally, Verdict};
use crate::format::{detect_file_format, preview_lines, FileFormat, PREVIEW_LINES};
use crate::live::{run_query, PageSource, Project};
use crate::loader::{load_json, DelimitedRows};
use crate::normalize::FieldNormalizer;
use crate::scanner::{parse_candidate, ObjectScanner};
use crate::table::{canonical_columns, TableWriter};
use crate::{Error, Field, Record};

pub const DEFAULT_FILTER_OUTPUT: &str = "ultra_strict_filtered_ip_data.tsv";
pub const DEFAULT_SCREEN_OUTPUT: &str = "pride_ip_datasets.tsv";
pub const DEFAULT_QUERY_TSV: &str = "pride_filtered_immunopeptidomics_timsTOF.tsv";
pub const DEFAULT_QUERY_JSON: &str = "pride_filtered_immunopeptidomics_timsTOF.json";

const SCAN_PROGRESS_EVERY: usize = 1_000;
const ROW_PROGRESS_EVERY: usize = 10_000;

/// Default conversion output: `.json` replaced by `_streaming.tsv`.
pub fn default_convert_output(input: &Path) -> PathBuf {
    let text = input.to_string_lossy();
    match text.strip_suffix(".json") {
        Some(stem) => PathBuf::from(format!("{}_streaming.tsv", stem)),
        None => PathBuf::from(format!("{}_streaming.tsv", text)),
    }
}

/// Counters from a streaming conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub candidates: usize,
    pub written: usize,
    pub failed: usize,
}

/// Stream a (possibly malformed) JSON export into a canonical TSV.
///
/// Each object is parsed, normalized, and written as soon as it is found;
/// unparseable objects are counted and skipped.
pub fn convert_json_to_tsv(
    input: &Path,
    output: &Path,
    normalizer: &FieldNormalizer,
) -> Result<ConvertReport, Error> {
    info!(input = %input.display(), output = %output.display(), "converting JSON to TSV");

    let scanner = ObjectScanner::open(input)?;
    let mut writer = TableWriter::new(BufWriter::new(File::create(output)?), canonical_columns())?;
    let mut report = ConvertReport::default();

    for candidate in scanner {
        let candidate = candidate?;
        report.candidates += 1;

        match parse_candidate(&candidate) {
            Some(raw) => {
                writer.write_record(&normalizer.normalize(&raw))?;
                report.written += 1;
            }
            None => {
                report.failed += 1;
                warn!(object = report.candidates, "failed to parse JSON object");
            }
        }

        if report.candidates % SCAN_PROGRESS_EVERY == 0 {
            info!(processed = report.candidates, "conversion progress");
        }
    }

    writer.finish()?;
    info!(
        written = report.written,
        failed = report.failed,
        "conversion complete"
    );
    Ok(report)
}

/// Which columns a filter run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Re-emit the input table's own header and rows. JSON input falls back
    /// to canonical columns.
    PreserveInput,
    /// Always the nine canonical columns.
    Canonical,
}

/// Counters from a filter run.
#[derive(Debug, Clone, Copy)]
pub struct FilterReport {
    pub format: FileFormat,
    pub tally: Tally,
    pub written: usize,
}

/// Load, classify, and write the accepted records of a bulk export.
///
/// Nothing is written when no record is accepted; the run then fails with
/// [`Error::NoMatches`] after logging the summary.
pub fn filter_file(
    input: &Path,
    output: &Path,
    classifier: &RelevanceClassifier,
    normalizer: &FieldNormalizer,
    shape: OutputShape,
) -> Result<FilterReport, Error> {
    let format = detect_file_format(input)?;
    info!(input = %input.display(), %format, "detected input format");

    let (columns, rows, tally) = match format {
        FileFormat::Json => filter_json(input, classifier, normalizer)?,
        FileFormat::Csv | FileFormat::Tsv => {
            let delimiter = format.delimiter().unwrap_or(b'\t');
            filter_table(input, delimiter, classifier, normalizer, shape)?
        }
        FileFormat::Unknown => {
            let preview = preview_lines(input, PREVIEW_LINES)?;
            return Err(Error::UnknownFormat {
                path: input.to_path_buf(),
                preview,
            });
        }
    };

    tally.log_summary(&input.to_string_lossy());

    if rows.is_empty() {
        return Err(Error::NoMatches { total: tally.total });
    }

    let mut writer = TableWriter::new(BufWriter::new(File::create(output)?), columns)?;
    for row in &rows {
        writer.write_row(row)?;
    }
    let written = writer.rows();
    writer.finish()?;
    info!(output = %output.display(), written, "filtered datasets saved");

    Ok(FilterReport {
        format,
        tally,
        written,
    })
}

type Filtered = (Vec<String>, Vec<Vec<String>>, Tally);

fn filter_json(
    input: &Path,
    classifier: &RelevanceClassifier,
    normalizer: &FieldNormalizer,
) -> Result<Filtered, Error> {
    let columns = canonical_columns();
    let loaded = load_json(input)?;
    let mut tally = Tally::new();
    for _ in 0..loaded.failed {
        tally.record_parse_failure();
    }

    let mut rows = Vec::new();
    for raw in &loaded.records {
        let record = normalizer.normalize(raw);
        let verdict = classifier.classify_record(&record);
        tally.record(&verdict);
        if verdict.is_accepted() {
            log_accepted(&record, &verdict);
            rows.push(columns.iter().map(|c| record.column(c).to_string()).collect());
        }
    }

    Ok((columns, rows, tally))
}

fn filter_table(
    input: &Path,
    delimiter: u8,
    classifier: &RelevanceClassifier,
    normalizer: &FieldNormalizer,
    shape: OutputShape,
) -> Result<Filtered, Error> {
    let mut table = DelimitedRows::open(input, delimiter)?;
    let columns = match shape {
        OutputShape::PreserveInput => table.headers().to_vec(),
        OutputShape::Canonical => canonical_columns(),
    };
    debug!(columns = ?columns, "output columns");

    let mut tally = Tally::new();
    let mut rows = Vec::new();
    while let Some(row) = table.next() {
        let row = row?;
        let record = normalizer.normalize(&table.raw_record(&row));
        let verdict = classifier.classify_record(&record);
        tally.record(&verdict);

        if tally.total % ROW_PROGRESS_EVERY == 0 {
            info!(processed = tally.total, "filter progress");
        }

        if verdict.is_accepted() {
            log_accepted(&record, &verdict);
            let out = match shape {
                OutputShape::PreserveInput => row,
                OutputShape::Canonical => {
                    columns.iter().map(|c| record.column(c).to_string()).collect()
                }
            };
            rows.push(out);
        }
    }

    Ok((columns, rows, tally))
}

fn log_accepted(record: &Record, verdict: &Verdict) {
    let title: String = record.get(Field::Title).chars().take(100).collect();
    info!(
        accession = record.get(Field::Accession),
        title = %title,
        keywords = record.get(Field::Keywords),
        exclusion_hit = verdict.exclusion_hit(),
        "matching dataset"
    );
}

/// Paths written by a live query.
#[derive(Debug, Clone)]
pub struct QueryOutputs {
    pub tsv: PathBuf,
    pub json: PathBuf,
}

impl Default for QueryOutputs {
    fn default() -> Self {
        Self {
            tsv: PathBuf::from(DEFAULT_QUERY_TSV),
            json: PathBuf::from(DEFAULT_QUERY_JSON),
        }
    }
}

/// Run a live query and write the accepted projects as TSV and JSON.
///
/// Both files are written even when nothing matched.
pub fn run_live_query<S: PageSource>(
    source: &mut S,
    max_pages: u32,
    classifier: &RelevanceClassifier,
    outputs: &QueryOutputs,
) -> Result<Vec<Project>, Error> {
    let outcome = run_query(source, max_pages, classifier);
    outcome.tally.log_summary("live query");
    info!(
        pages = outcome.pages_fetched,
        matched = outcome.accepted.len(),
        "query complete"
    );

    let mut file = BufWriter::new(File::create(&outputs.json)?);
    serde_json::to_writer_pretty(&mut file, &outcome.accepted)?;
    file.flush()?;
    info!(path = %outputs.json.display(), "saved JSON results");

    let columns = Project::COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut writer = TableWriter::create(&outputs.tsv, columns)?;
    for project in &outcome.accepted {
        writer.write_row(&project.row())?;
    }
    writer.finish()?;
    info!(path = %outputs.tsv.display(), "saved TSV results");

    Ok(outcome.accepted)
}
