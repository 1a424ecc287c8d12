//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode between reading the inputs and printing the outcome.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific failure, providing a single error type
/// that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: coexpr_core::ConfigError,
    },

    /// The command line was incomplete.
    #[error("usage: coexpr-engine <corpus.json> <request.json>")]
    Usage,

    /// An input file could not be read, or the outcome could not be written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file involved (`-` for stdout).
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The corpus file is not a valid corpus.
    #[error("invalid corpus {}: {source}", path.display())]
    Corpus {
        /// The corpus file.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The request file is not a valid search request.
    #[error("invalid request {}: {source}", path.display())]
    Request {
        /// The request file.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The search itself failed.
    #[error("search error: {source}")]
    Search {
        /// The underlying search error.
        #[from]
        source: coexpr_core::SearchError,
    },

    /// The outcome could not be serialized.
    #[error("failed to serialize outcome: {source}")]
    Output {
        /// The underlying serialization error.
        source: serde_json::Error,
    },
}
