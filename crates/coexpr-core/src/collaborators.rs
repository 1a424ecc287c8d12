//! Collaborator traits consumed by the engine.
//!
//! The engine never stores coexpression data, gene records, or experiment
//! metadata itself. It reaches them through these traits, each of which may
//! be backed by a database, a cache, or the in-memory corpus used by tests
//! and the engine binary. All calls are blocking from the engine's point of
//! view and receive the search [`Deadline`].

use std::collections::{BTreeMap, BTreeSet};

use coexpr_types::{ExperimentId, GeneId, GeneNodeDegree, GeneRef, RawLink, TaxonId};

use crate::deadline::Deadline;

/// Errors reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// A record the caller insisted on does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record (e.g. "gene").
        entity: &'static str,
        /// The missing key.
        id: u64,
    },

    /// The backing store could not answer.
    #[error("collaborator unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The search deadline passed before the call could complete.
    #[error("search deadline exceeded")]
    DeadlineExceeded,
}

/// Links grouped by the query gene they were found for.
pub type LinksByGene = BTreeMap<GeneId, Vec<RawLink>>;

/// Source of experiments eligible for a search.
pub trait ExperimentFilter {
    /// Experiments of `taxon` that have a coexpression analysis, are not
    /// flagged as troubled, and are visible to the caller.
    ///
    /// When `candidates` is given, the result is restricted to it.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the filter cannot be evaluated.
    fn qualifying_experiments(
        &self,
        candidates: Option<&BTreeSet<ExperimentId>>,
        taxon: TaxonId,
        deadline: &Deadline,
    ) -> Result<BTreeSet<ExperimentId>, CollaboratorError>;
}

/// Gene-metadata lookups.
pub trait GeneMetadata {
    /// Resolve every id in `ids` that exists. Missing ids are simply absent
    /// from the returned map.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the lookup fails.
    fn load_by_ids(
        &self,
        ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<BTreeMap<GeneId, GeneRef>, CollaboratorError>;

    /// Resolve a single gene.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::NotFound`] if the gene does not exist.
    fn load_by_id(&self, id: GeneId, deadline: &Deadline) -> Result<GeneRef, CollaboratorError> {
        self.load_by_ids(&BTreeSet::from([id]), deadline)?
            .remove(&id)
            .ok_or(CollaboratorError::NotFound {
                entity: "gene",
                id: id.into_inner(),
            })
    }
}

/// Parameters shared by both link-store queries.
#[derive(Debug, Clone, Copy)]
pub struct LinkQuery<'a> {
    /// Taxon of the query genes.
    pub taxon: TaxonId,
    /// The query genes.
    pub gene_ids: &'a BTreeSet<GeneId>,
    /// Experiments whose evidence counts.
    pub experiment_ids: &'a BTreeSet<ExperimentId>,
    /// Minimum number of supporting experiments.
    pub min_support: u32,
    /// Use the store's faster, less complete query path.
    pub quick: bool,
}

/// Store of precomputed coexpression links.
pub trait CoexpressionLinkStore {
    /// Links from each query gene to any partner, at most
    /// `max_results_per_gene` per query gene.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the store cannot be queried.
    fn find_coexpression_relationships(
        &self,
        query: &LinkQuery<'_>,
        max_results_per_gene: usize,
        deadline: &Deadline,
    ) -> Result<LinksByGene, CollaboratorError>;

    /// Links whose both ends are query genes.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the store cannot be queried.
    fn find_inter_coexpression_relationships(
        &self,
        query: &LinkQuery<'_>,
        deadline: &Deadline,
    ) -> Result<LinksByGene, CollaboratorError>;
}

/// Genome-wide node-degree statistics.
pub trait NodeDegreeStats {
    /// Statistics for every gene in `ids` that has them.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the statistics cannot be read.
    fn node_degrees(
        &self,
        ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<BTreeMap<GeneId, GeneNodeDegree>, CollaboratorError>;
}

/// The four collaborators a search needs, borrowed for the executor's
/// lifetime.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Experiment eligibility.
    pub experiments: &'a dyn ExperimentFilter,
    /// Gene lookups.
    pub genes: &'a dyn GeneMetadata,
    /// Coexpression links.
    pub links: &'a dyn CoexpressionLinkStore,
    /// Genome-wide node degrees.
    pub node_degrees: &'a dyn NodeDegreeStats,
}

impl<'a> Collaborators<'a> {
    /// Use one backend for all four roles.
    pub fn uniform<T>(backend: &'a T) -> Self
    where
        T: ExperimentFilter + GeneMetadata + CoexpressionLinkStore + NodeDegreeStats,
    {
        Self {
            experiments: backend,
            genes: backend,
            links: backend,
            node_degrees: backend,
        }
    }
}

impl core::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
