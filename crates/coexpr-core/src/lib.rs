//! Adaptive coexpression search for the coexpression engine.
//!
//! Given a set of query genes and a pool of experiments, this crate finds
//! gene pairs whose expression is correlated across many experiments. It
//! picks a stringency from the size of the query, retries with lower
//! stringency when nothing is found, caps oversized result sets, and
//! annotates what remains with genome-wide node-degree statistics.
//!
//! # Modules
//!
//! - [`assembler`] -- Raw links to validated result rows for one query gene.
//! - [`collaborators`] -- Traits for the experiment filter, gene metadata,
//!   link store, and node-degree statistics.
//! - [`config`] -- Configuration loading from `coexpr-config.yaml` into
//!   strongly-typed structs.
//! - [`deadline`] -- Cooperative per-search deadline.
//! - [`executor`] -- [`CoexpressionQueryExecutor`], the search orchestrator.
//! - [`memory`] -- [`InMemoryCorpus`], a JSON-loaded collaborator backend.
//! - [`node_degree`] -- Node-degree annotation of rows and summaries.
//! - [`stringency`] -- Initial stringency heuristic.
//! - [`trimmer`] -- Capping results to the row budget.
//!
//! [`CoexpressionQueryExecutor`]: executor::CoexpressionQueryExecutor
//! [`InMemoryCorpus`]: memory::InMemoryCorpus

pub mod assembler;
pub mod collaborators;
pub mod config;
pub mod deadline;
pub mod executor;
pub mod memory;
pub mod node_degree;
pub mod stringency;
pub mod trimmer;

pub use collaborators::{
    CoexpressionLinkStore, CollaboratorError, Collaborators, ExperimentFilter, GeneMetadata,
    LinkQuery, LinksByGene, NodeDegreeStats,
};
pub use config::{ConfigError, EngineConfig, LoggingConfig, SearchConfig};
pub use deadline::Deadline;
pub use executor::{CoexpressionQueryExecutor, SearchError};
pub use memory::{CorpusExperiment, InMemoryCorpus};
