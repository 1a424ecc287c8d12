//! Search request and outcome types.
//!
//! A search either completes with a [`SearchResult`] or is rejected for a
//! caller-input reason. Callers match on [`SearchOutcome`] before touching
//! any rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ExperimentId, GeneId, TaxonId};
use crate::results::SearchResult;

/// Minimum support used when a request does not name one.
pub const DEFAULT_STRINGENCY: u32 = 3;

/// Per-gene result cap used when a request does not name one.
pub const DEFAULT_MAX_RESULTS_PER_GENE: usize = 200;

/// A coexpression search as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SearchRequest {
    /// Experiments to restrict the search to. `None` searches every
    /// qualifying experiment for the taxon.
    #[serde(default)]
    pub experiment_ids: Option<BTreeSet<ExperimentId>>,
    /// The query genes.
    pub gene_ids: BTreeSet<GeneId>,
    /// Requested minimum support. Values below 1 are raised to 1.
    #[serde(default = "default_stringency")]
    pub stringency: u32,
    /// Cap on links returned per query gene.
    #[serde(default = "default_max_results_per_gene")]
    pub max_results_per_gene: usize,
    /// Only report links between two query genes.
    #[serde(default)]
    pub query_genes_only: bool,
    /// Ask the link store for its faster, less complete query path.
    #[serde(default)]
    pub quick: bool,
}

impl SearchRequest {
    /// Create a request for `gene_ids` over all qualifying experiments with
    /// default settings.
    pub fn new(gene_ids: impl IntoIterator<Item = GeneId>) -> Self {
        Self {
            experiment_ids: None,
            gene_ids: gene_ids.into_iter().collect(),
            stringency: DEFAULT_STRINGENCY,
            max_results_per_gene: DEFAULT_MAX_RESULTS_PER_GENE,
            query_genes_only: false,
            quick: false,
        }
    }
}

const fn default_stringency() -> u32 {
    DEFAULT_STRINGENCY
}

const fn default_max_results_per_gene() -> usize {
    DEFAULT_MAX_RESULTS_PER_GENE
}

/// Why a search was refused before any links were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SearchRejection {
    /// The request named no genes.
    NoGenesSelected,
    /// No experiment qualified for the query genes' taxon.
    NoExperimentsSelected,
    /// Some query genes are unknown to the gene store.
    UnknownGenes {
        /// The ids that did not resolve.
        gene_ids: Vec<GeneId>,
    },
    /// The query genes belong to more than one taxon.
    MixedTaxa {
        /// Query gene ids grouped by taxon.
        taxa: BTreeMap<TaxonId, Vec<GeneId>>,
    },
}

impl SearchRejection {
    /// Human-readable reason, as shown to users.
    pub fn message(&self) -> String {
        match self {
            Self::NoGenesSelected => String::from("No genes selected"),
            Self::NoExperimentsSelected => String::from("No experiments selected"),
            Self::UnknownGenes { gene_ids } => {
                let ids: Vec<String> = gene_ids.iter().map(ToString::to_string).collect();
                format!("Unknown genes: {}", ids.join(", "))
            }
            Self::MixedTaxa { taxa } => {
                format!("Query genes span {} taxa; select genes from one taxon", taxa.len())
            }
        }
    }
}

impl core::fmt::Display for SearchRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message())
    }
}

/// The outcome of one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SearchOutcome {
    /// The search ran; the payload may still hold zero rows.
    Completed(Box<SearchResult>),
    /// The search was refused.
    Rejected(SearchRejection),
}

impl SearchOutcome {
    /// The completed result, if any.
    pub fn result(&self) -> Option<&SearchResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Rejected(_) => None,
        }
    }

    /// Consume the outcome, yielding the completed result if any.
    pub fn into_result(self) -> Option<SearchResult> {
        match self {
            Self::Completed(result) => Some(*result),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection, if the search was refused.
    pub const fn rejection(&self) -> Option<&SearchRejection> {
        match self {
            Self::Completed(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }

    /// Legacy error-state view: the rejection message, or `None` on success.
    pub fn error_state(&self) -> Option<String> {
        self.rejection().map(SearchRejection::message)
    }
}
