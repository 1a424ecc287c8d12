//! Shared type definitions for the coexpression search engine.
//!
//! This crate is the single source of truth for the records exchanged
//! between the engine, its collaborators, and callers. Types defined here
//! flow downstream to `TypeScript` via `ts-rs` for the exploration front end.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for gene, experiment, and taxon keys
//! - [`structs`] -- Collaborator records (genes, raw links, node degrees)
//! - [`results`] -- Result rows, summaries, diagnostics, and the search result
//! - [`request`] -- Search request and the tagged search outcome

pub mod ids;
pub mod request;
pub mod results;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::{ExperimentId, GeneId, TaxonId};
pub use request::{
    DEFAULT_MAX_RESULTS_PER_GENE, DEFAULT_STRINGENCY, SearchOutcome, SearchRejection,
    SearchRequest,
};
pub use results::{
    Diagnostic, NodeDegreeAnnotation, ResultRow, SearchResult, Summary, dataset_vector,
    sort_key_for,
};
pub use structs::{GeneNodeDegree, GeneRef, RawLink};
