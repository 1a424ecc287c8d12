//! Command-line runner for the coexpression search engine.
//!
//! Loads configuration, a JSON corpus, and a JSON search request, runs one
//! search against the corpus, and prints the tagged outcome as JSON on
//! stdout. Logs go to stderr.
//!
//! ```bash
//! coexpr-engine demos/corpus.json demos/request.json
//! ```
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `COEXPR_CONFIG` (default `coexpr-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the corpus
//! 4. Load the search request
//! 5. Run the search
//! 6. Print the outcome

mod error;

use std::io::Write;
use std::path::{Path, PathBuf};

use coexpr_core::{
    CoexpressionQueryExecutor, Collaborators, EngineConfig, InMemoryCorpus, LoggingConfig,
};
use coexpr_types::{SearchOutcome, SearchRequest};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file read when `COEXPR_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "coexpr-config.yaml";

/// Application entry point for the engine binary.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, the search fails, or the
/// outcome cannot be written.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("coexpr-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        panel_size_cutoff = config.search.panel_size_cutoff,
        max_edges = config.search.max_edges,
        backoff_step = config.search.backoff_step,
        stringency_floor = config.search.stringency_floor,
        search_timeout_ms = config.search.search_timeout_ms,
        "Search configuration"
    );

    let mut args = std::env::args_os().skip(1);
    let (Some(corpus_path), Some(request_path)) = (args.next(), args.next()) else {
        return Err(EngineError::Usage.into());
    };
    let corpus_path = PathBuf::from(corpus_path);
    let request_path = PathBuf::from(request_path);

    // 3. Load the corpus.
    let corpus = load_corpus(&corpus_path)?;
    info!(
        path = %corpus_path.display(),
        genes = corpus.gene_count(),
        "Corpus loaded"
    );

    // 4. Load the search request.
    let request = load_request(&request_path)?;
    info!(
        genes = request.gene_ids.len(),
        stringency = request.stringency,
        query_genes_only = request.query_genes_only,
        "Search request loaded"
    );

    // 5. Run the search.
    let executor =
        CoexpressionQueryExecutor::new(config.search, Collaborators::uniform(&corpus));
    let outcome = executor.search(&request).map_err(EngineError::from)?;
    match &outcome {
        SearchOutcome::Completed(result) => info!(
            rows = result.results.len(),
            stringency = result.query_stringency,
            "Search completed"
        ),
        SearchOutcome::Rejected(reason) => warn!(reason = %reason, "Search rejected"),
    }

    // 6. Print the outcome.
    write_outcome(&outcome)?;

    info!("coexpr-engine finished");
    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration from `COEXPR_CONFIG` or `coexpr-config.yaml`.
///
/// A missing file yields the defaults (environment overrides still apply).
/// Returns the path that was read, if any.
fn load_config() -> Result<(EngineConfig, Option<PathBuf>), EngineError> {
    let config_path = std::env::var_os("COEXPR_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if config_path.exists() {
        let config = EngineConfig::from_file(&config_path)?;
        Ok((config, Some(config_path)))
    } else {
        Ok((EngineConfig::parse("")?, None))
    }
}

fn load_corpus(path: &Path) -> Result<InMemoryCorpus, EngineError> {
    let contents = read(path)?;
    InMemoryCorpus::from_json(&contents).map_err(|source| EngineError::Corpus {
        path: path.to_path_buf(),
        source,
    })
}

fn load_request(path: &Path) -> Result<SearchRequest, EngineError> {
    let contents = read(path)?;
    serde_json::from_str(&contents).map_err(|source| EngineError::Request {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_outcome(outcome: &SearchOutcome) -> Result<(), EngineError> {
    let json =
        serde_json::to_string_pretty(outcome).map_err(|source| EngineError::Output { source })?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").map_err(|source| EngineError::Io {
        path: PathBuf::from("-"),
        source,
    })
}
