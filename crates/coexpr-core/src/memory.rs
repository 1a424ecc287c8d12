//! In-memory collaborator backend loaded from a JSON corpus.
//!
//! [`InMemoryCorpus`] implements all four collaborator traits over a small,
//! fully materialised dataset. The engine binary runs searches against it,
//! and the integration tests use it for end-to-end checks.
//!
//! Links are directed: a link is returned only when its `query_gene_id` is
//! one of the query genes. A corpus that wants a pair to be found from both
//! ends lists it twice.

use std::collections::{BTreeMap, BTreeSet};

use coexpr_types::{ExperimentId, GeneId, GeneNodeDegree, GeneRef, RawLink, TaxonId};
use serde::Deserialize;
use tracing::debug;

use crate::collaborators::{
    CoexpressionLinkStore, CollaboratorError, ExperimentFilter, GeneMetadata, LinkQuery,
    LinksByGene, NodeDegreeStats,
};
use crate::deadline::Deadline;

/// An experiment known to the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CorpusExperiment {
    /// Experiment identifier.
    pub id: ExperimentId,
    /// Taxon the experiment was run on.
    pub taxon: TaxonId,
    /// Troubled experiments never qualify for a search.
    #[serde(default)]
    pub troubled: bool,
}

/// The JSON layout of a corpus file.
#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    genes: Vec<GeneRef>,
    #[serde(default)]
    experiments: Vec<CorpusExperiment>,
    #[serde(default)]
    links: Vec<RawLink>,
    #[serde(default)]
    node_degrees: Vec<GeneNodeDegree>,
}

/// A complete coexpression dataset held in memory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CorpusFile")]
pub struct InMemoryCorpus {
    genes: BTreeMap<GeneId, GeneRef>,
    experiments: BTreeMap<ExperimentId, CorpusExperiment>,
    links: Vec<RawLink>,
    node_degrees: BTreeMap<GeneId, GeneNodeDegree>,
}

impl From<CorpusFile> for InMemoryCorpus {
    fn from(file: CorpusFile) -> Self {
        Self {
            genes: file.genes.into_iter().map(|g| (g.id, g)).collect(),
            experiments: file.experiments.into_iter().map(|e| (e.id, e)).collect(),
            links: file.links,
            node_degrees: file
                .node_degrees
                .into_iter()
                .map(|d| (d.gene_id, d))
                .collect(),
        }
    }
}

impl InMemoryCorpus {
    /// Parse a corpus from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let corpus: Self = serde_json::from_str(json)?;
        debug!(
            genes = corpus.genes.len(),
            experiments = corpus.experiments.len(),
            links = corpus.links.len(),
            node_degrees = corpus.node_degrees.len(),
            "Loaded in-memory corpus"
        );
        Ok(corpus)
    }

    /// Number of genes in the corpus.
    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    /// Links for the query genes of `query`, restricted to its experiments
    /// and minimum support. With `inter`, both ends must be query genes.
    fn matching_links(&self, query: &LinkQuery<'_>, inter: bool) -> LinksByGene {
        let mut by_gene = LinksByGene::new();
        for link in &self.links {
            if !query.gene_ids.contains(&link.query_gene_id) {
                continue;
            }
            if inter && !query.gene_ids.contains(&link.found_gene_id) {
                continue;
            }
            if self
                .genes
                .get(&link.query_gene_id)
                .is_none_or(|gene| gene.taxon != query.taxon)
            {
                continue;
            }
            let link = restrict_to_experiments(link, query.experiment_ids);
            if link.num_datasets_supporting == 0
                || link.num_datasets_supporting < query.min_support
            {
                continue;
            }
            by_gene.entry(link.query_gene_id).or_default().push(link);
        }
        by_gene
    }
}

/// Recount a link's evidence over the searched experiments.
///
/// Experiment lists that were never recorded are taken at face value.
fn restrict_to_experiments(link: &RawLink, experiments: &BTreeSet<ExperimentId>) -> RawLink {
    let mut restricted = link.clone();
    if !link.supporting_experiment_ids.is_empty() {
        restricted.supporting_experiment_ids = link
            .supporting_experiment_ids
            .intersection(experiments)
            .copied()
            .collect();
        restricted.num_datasets_supporting =
            u32::try_from(restricted.supporting_experiment_ids.len()).unwrap_or(u32::MAX);
    }
    if !link.tested_in_experiment_ids.is_empty() {
        restricted.tested_in_experiment_ids = link
            .tested_in_experiment_ids
            .intersection(experiments)
            .copied()
            .collect();
        let tested = link
            .tested_experiments()
            .filter(|id| experiments.contains(id))
            .count();
        restricted.num_datasets_tested_in = u32::try_from(tested).unwrap_or(u32::MAX);
    }
    restricted
}

impl ExperimentFilter for InMemoryCorpus {
    fn qualifying_experiments(
        &self,
        candidates: Option<&BTreeSet<ExperimentId>>,
        taxon: TaxonId,
        deadline: &Deadline,
    ) -> Result<BTreeSet<ExperimentId>, CollaboratorError> {
        deadline.check()?;
        Ok(self
            .experiments
            .values()
            .filter(|e| e.taxon == taxon && !e.troubled)
            .filter(|e| candidates.is_none_or(|c| c.contains(&e.id)))
            .map(|e| e.id)
            .collect())
    }
}

impl GeneMetadata for InMemoryCorpus {
    fn load_by_ids(
        &self,
        ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<BTreeMap<GeneId, GeneRef>, CollaboratorError> {
        deadline.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.genes.get(id).map(|g| (*id, g.clone())))
            .collect())
    }
}

impl CoexpressionLinkStore for InMemoryCorpus {
    fn find_coexpression_relationships(
        &self,
        query: &LinkQuery<'_>,
        max_results_per_gene: usize,
        deadline: &Deadline,
    ) -> Result<LinksByGene, CollaboratorError> {
        deadline.check()?;
        let mut by_gene = self.matching_links(query, false);
        if max_results_per_gene > 0 {
            for links in by_gene.values_mut() {
                links.sort_by(|a, b| {
                    b.num_datasets_supporting
                        .cmp(&a.num_datasets_supporting)
                        .then(a.found_gene_id.cmp(&b.found_gene_id))
                });
                links.truncate(max_results_per_gene);
            }
        }
        Ok(by_gene)
    }

    fn find_inter_coexpression_relationships(
        &self,
        query: &LinkQuery<'_>,
        deadline: &Deadline,
    ) -> Result<LinksByGene, CollaboratorError> {
        deadline.check()?;
        Ok(self.matching_links(query, true))
    }
}

impl NodeDegreeStats for InMemoryCorpus {
    fn node_degrees(
        &self,
        ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<BTreeMap<GeneId, GeneNodeDegree>, CollaboratorError> {
        deadline.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.node_degrees.get(id).map(|d| (*id, d.clone())))
            .collect())
    }
}
