use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pridesift::classify::{Profile, RelevanceClassifier, Vocabulary, VocabularyConfig};
use pridesift::live::{self, PrideClient, QueryConfig};
use pridesift::normalize::FieldNormalizer;
use pridesift::pipeline::{self, OutputShape, QueryOutputs};
use pridesift::Error;

/// Pridesift - screen PRIDE Archive metadata for timsTOF cancer immunopeptidomics
#[derive(Parser, Debug)]
#[command(name = "pridesift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON file overriding the built-in term lists
    #[arg(long, global = true, value_name = "FILE")]
    vocabulary: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a (possibly malformed) JSON export into a canonical TSV
    Convert {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Defaults to the input name with `.json` replaced by `_streaming.tsv`
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Ultra-strict filter over a JSON, CSV, or TSV export
    Filter {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT", default_value = pipeline::DEFAULT_FILTER_OUTPUT)]
        output: PathBuf,

        /// Print the active term lists before filtering
        #[arg(long)]
        print_criteria: bool,
    },

    /// Broad screen over a JSON, CSV, or TSV export (canonical columns)
    Screen {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT", default_value = pipeline::DEFAULT_SCREEN_OUTPUT)]
        output: PathBuf,
    },

    /// Query the PRIDE Archive and keep strictly matching projects
    Query {
        #[arg(long, default_value = pipeline::DEFAULT_QUERY_TSV)]
        output: PathBuf,

        #[arg(long, default_value = pipeline::DEFAULT_QUERY_JSON)]
        json_output: PathBuf,

        #[arg(long, default_value = live::DEFAULT_QUERY)]
        query: String,

        #[arg(long, default_value_t = live::DEFAULT_MAX_PAGES)]
        max_pages: u32,

        #[arg(long, default_value_t = live::DEFAULT_PAGE_SIZE)]
        page_size: u32,

        #[arg(long, default_value = live::DEFAULT_BASE_URL)]
        base_url: String,

        #[arg(long, default_value_t = live::DEFAULT_TIMEOUT.as_secs())]
        timeout_secs: u64,
    },
}

impl Cli {
    fn default_directive(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_vocabulary(path: Option<&Path>) -> Result<Arc<Vocabulary>, Error> {
    match path {
        Some(path) => {
            let config = VocabularyConfig::from_path(path)?;
            info!(path = %path.display(), "loaded vocabulary overrides");
            Ok(Arc::new(Vocabulary::new(&config)?))
        }
        None => Ok(Vocabulary::builtin()),
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let vocabulary = load_vocabulary(cli.vocabulary.as_deref())?;
    let normalizer = FieldNormalizer::default();

    match cli.command {
        Command::Convert { input, output } => {
            let output = output.unwrap_or_else(|| pipeline::default_convert_output(&input));
            pipeline::convert_json_to_tsv(&input, &output, &normalizer)?;
        }
        Command::Filter {
            input,
            output,
            print_criteria,
        } => {
            if print_criteria {
                println!("Field scope:\n{}", Profile::UltraStrict.scope());
                println!("{}", vocabulary.describe());
            }
            let classifier = RelevanceClassifier::for_profile(Profile::UltraStrict, vocabulary);
            pipeline::filter_file(
                &input,
                &output,
                &classifier,
                &normalizer,
                OutputShape::PreserveInput,
            )?;
        }
        Command::Screen { input, output } => {
            let classifier = RelevanceClassifier::for_profile(Profile::Broad, vocabulary);
            pipeline::filter_file(
                &input,
                &output,
                &classifier,
                &normalizer,
                OutputShape::Canonical,
            )?;
        }
        Command::Query {
            output,
            json_output,
            query,
            max_pages,
            page_size,
            base_url,
            timeout_secs,
        } => {
            let config = QueryConfig {
                base_url,
                query,
                max_pages,
                page_size,
                timeout: Duration::from_secs(timeout_secs),
            };
            info!(query = %config.query, max_pages, "querying PRIDE Archive");
            let mut client = PrideClient::new(config);
            let classifier = RelevanceClassifier::for_profile(Profile::LiveQuery, vocabulary);
            let outputs = QueryOutputs {
                tsv: output,
                json: json_output,
            };
            let accepted = pipeline::run_live_query(&mut client, max_pages, &classifier, &outputs)?;
            info!(matched = accepted.len(), "strictly matching datasets retrieved");
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.default_directive());

    if let Err(e) = run(cli) {
        error!("{}", e);
        if let Error::UnknownFormat { preview, .. } = &e {
            for (i, line) in preview.iter().enumerate() {
                error!(line = i + 1, "{}", line);
            }
        }
        std::process::exit(1);
    }
}
