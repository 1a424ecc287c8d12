//! Configuration loading and typed config structures for the search engine.
//!
//! The canonical configuration lives in `coexpr-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads the file and applies environment overrides. Every
//! field has a default, so an empty file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held a value that is not a number.
    #[error("environment variable {name} is not a valid number: {value}")]
    InvalidOverride {
        /// The variable name.
        name: &'static str,
        /// The offending value.
        value: String,
    },

    /// A setting holds a value the engine cannot run with.
    #[error("config value {name} is invalid: {reason}")]
    InvalidValue {
        /// The setting name.
        name: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Search tuning knobs.
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `COEXPR_MAX_EDGES` overrides `search.max_edges`
    /// - `COEXPR_SEARCH_TIMEOUT_MS` overrides `search.search_timeout_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if an override is not a number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML,
    /// [`ConfigError::InvalidOverride`] if an override is not a number, or
    /// [`ConfigError::InvalidValue`] if the result fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config
            .search
            .apply_overrides(|name| std::env::var(name).ok())?;
        config.search.validate()?;
        Ok(config)
    }
}

/// Tuning knobs for the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchConfig {
    /// Query panels larger than this always run in query-genes-only mode.
    #[serde(default = "default_panel_size_cutoff")]
    pub panel_size_cutoff: usize,

    /// Row budget for trimming.
    #[serde(default = "default_max_edges")]
    pub max_edges: usize,

    /// How far the minimum support drops per empty back-off attempt.
    #[serde(default = "default_backoff_step")]
    pub backoff_step: u32,

    /// The back-off never queries below this minimum support.
    #[serde(default = "default_stringency_floor")]
    pub stringency_floor: u32,

    /// Node-degree passes slower than this are flagged.
    #[serde(default = "default_node_degree_slow_ms")]
    pub node_degree_slow_ms: u64,

    /// Wall-clock budget for one search. 0 means unbounded.
    #[serde(default)]
    pub search_timeout_ms: u64,
}

impl SearchConfig {
    /// Apply overrides looked up by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a value is not a number.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("COEXPR_MAX_EDGES") {
            self.max_edges = value
                .trim()
                .parse()
                .map_err(|_parse| ConfigError::InvalidOverride {
                    name: "COEXPR_MAX_EDGES",
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup("COEXPR_SEARCH_TIMEOUT_MS") {
            self.search_timeout_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|_parse| ConfigError::InvalidOverride {
                        name: "COEXPR_SEARCH_TIMEOUT_MS",
                        value: value.clone(),
                    })?;
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `max_edges` is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_edges == 0 {
            return Err(ConfigError::InvalidValue {
                name: "search.max_edges",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Back-off step, never less than 1.
    pub fn effective_backoff_step(&self) -> u32 {
        self.backoff_step.max(1)
    }

    /// Per-search timeout, if one is configured.
    pub const fn search_timeout(&self) -> Option<Duration> {
        if self.search_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.search_timeout_ms))
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            panel_size_cutoff: default_panel_size_cutoff(),
            max_edges: default_max_edges(),
            backoff_step: default_backoff_step(),
            stringency_floor: default_stringency_floor(),
            node_degree_slow_ms: default_node_degree_slow_ms(),
            search_timeout_ms: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingConfig {
    /// Whether JSON log output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_panel_size_cutoff() -> usize {
    50
}

const fn default_max_edges() -> usize {
    2000
}

const fn default_backoff_step() -> u32 {
    3
}

const fn default_stringency_floor() -> u32 {
    2
}

const fn default_node_degree_slow_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}
