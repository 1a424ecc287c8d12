//! Recording collaborator backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use coexpr_core::{
    CoexpressionLinkStore, CollaboratorError, Deadline, ExperimentFilter, GeneMetadata, LinkQuery,
    LinksByGene, NodeDegreeStats,
};
use coexpr_types::{ExperimentId, GeneId, GeneNodeDegree, GeneRef, RawLink, TaxonId};

/// Human.
pub const HUMAN: TaxonId = TaxonId::new(9606);

/// Mouse.
pub const MOUSE: TaxonId = TaxonId::new(10090);

/// One collaborator invocation, as seen by [`Backend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `qualifying_experiments`.
    Experiments,
    /// `load_by_ids` with this many ids.
    Genes(usize),
    /// `find_coexpression_relationships` at this minimum support.
    Links(u32),
    /// `find_inter_coexpression_relationships` at this minimum support.
    InterLinks(u32),
    /// `node_degrees` with this many ids.
    NodeDegrees(usize),
}

/// Scriptable backend that records every call it receives.
#[derive(Debug, Default)]
pub struct Backend {
    pub genes: BTreeMap<GeneId, GeneRef>,
    pub experiments: BTreeSet<ExperimentId>,
    pub links: Vec<RawLink>,
    pub node_degrees: BTreeMap<GeneId, GeneNodeDegree>,
    pub fail_links: bool,
    calls: Mutex<Vec<Call>>,
}

impl Backend {
    /// A backend with `num_experiments` human experiments and no genes.
    pub fn with_experiments(num_experiments: u64) -> Self {
        Self {
            experiments: (1..=num_experiments).map(ExperimentId::new).collect(),
            ..Self::default()
        }
    }

    /// Register a human gene.
    pub fn gene(mut self, id: u64, symbol: &str) -> Self {
        self.genes
            .insert(GeneId::new(id), GeneRef::new(GeneId::new(id), symbol, HUMAN));
        self
    }

    /// Register a gene of another taxon.
    pub fn gene_in(mut self, id: u64, symbol: &str, taxon: TaxonId) -> Self {
        self.genes
            .insert(GeneId::new(id), GeneRef::new(GeneId::new(id), symbol, taxon));
        self
    }

    /// Register a link with the given support.
    pub fn link(mut self, query: u64, found: u64, support: u32, positive: bool) -> Self {
        self.links.push(raw_link(query, found, support, positive));
        self
    }

    /// Register node-degree statistics for a gene.
    pub fn degree(mut self, id: u64) -> Self {
        self.node_degrees.insert(
            GeneId::new(id),
            GeneNodeDegree {
                gene_id: GeneId::new(id),
                positive_link_counts: vec![0, 40, 30, 20, 10, 5, 1],
                negative_link_counts: vec![0, 12, 6, 3, 1, 0, 0],
                positive_relative_ranks: vec![0.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4],
                negative_relative_ranks: vec![0.0, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0],
            },
        );
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Minimum supports of every link-store call, in order.
    pub fn link_stringencies(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Links(s) | Call::InterLinks(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn links_for(&self, query: &LinkQuery<'_>, inter: bool) -> LinksByGene {
        let mut by_gene = LinksByGene::new();
        for link in &self.links {
            if query.gene_ids.contains(&link.query_gene_id)
                && link.num_datasets_supporting >= query.min_support
                && (!inter || query.gene_ids.contains(&link.found_gene_id))
            {
                by_gene
                    .entry(link.query_gene_id)
                    .or_default()
                    .push(link.clone());
            }
        }
        by_gene
    }
}

impl ExperimentFilter for Backend {
    fn qualifying_experiments(
        &self,
        candidates: Option<&BTreeSet<ExperimentId>>,
        _taxon: TaxonId,
        deadline: &Deadline,
    ) -> Result<BTreeSet<ExperimentId>, CollaboratorError> {
        self.record(Call::Experiments);
        deadline.check()?;
        Ok(self
            .experiments
            .iter()
            .filter(|id| candidates.is_none_or(|c| c.contains(id)))
            .copied()
            .collect())
    }
}

impl GeneMetadata for Backend {
    fn load_by_ids(
        &self,
        ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<BTreeMap<GeneId, GeneRef>, CollaboratorError> {
        self.record(Call::Genes(ids.len()));
        deadline.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.genes.get(id).map(|g| (*id, g.clone())))
            .collect())
    }
}

impl CoexpressionLinkStore for Backend {
    fn find_coexpression_relationships(
        &self,
        query: &LinkQuery<'_>,
        _max_results_per_gene: usize,
        deadline: &Deadline,
    ) -> Result<LinksByGene, CollaboratorError> {
        self.record(Call::Links(query.min_support));
        deadline.check()?;
        if self.fail_links {
            return Err(CollaboratorError::Unavailable {
                message: String::from("link store offline"),
            });
        }
        Ok(self.links_for(query, false))
    }

    fn find_inter_coexpression_relationships(
        &self,
        query: &LinkQuery<'_>,
        deadline: &Deadline,
    ) -> Result<LinksByGene, CollaboratorError> {
        self.record(Call::InterLinks(query.min_support));
        deadline.check()?;
        Ok(self.links_for(query, true))
    }
}

impl NodeDegreeStats for Backend {
    fn node_degrees(
        &self,
        ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<BTreeMap<GeneId, GeneNodeDegree>, CollaboratorError> {
        self.record(Call::NodeDegrees(ids.len()));
        deadline.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.node_degrees.get(id).map(|d| (*id, d.clone())))
            .collect())
    }
}

/// A raw link without experiment detail.
pub fn raw_link(query: u64, found: u64, support: u32, positive: bool) -> RawLink {
    RawLink {
        query_gene_id: GeneId::new(query),
        found_gene_id: GeneId::new(found),
        is_positive_correlation: positive,
        num_datasets_supporting: support,
        num_datasets_tested_in: support.saturating_add(2),
        supporting_experiment_ids: BTreeSet::new(),
        tested_in_experiment_ids: BTreeSet::new(),
    }
}

/// Gene ids from raw keys.
pub fn gene_ids(raw: &[u64]) -> Vec<GeneId> {
    raw.iter().copied().map(GeneId::new).collect()
}
