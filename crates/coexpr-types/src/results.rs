//! Result-side types built by the engine during one search.
//!
//! A [`SearchResult`] is created fresh per call, filled in during assembly,
//! and handed to the caller read-only. Nothing here is shared across calls.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ExperimentId, GeneId};
use crate::structs::{GeneNodeDegree, GeneRef, RawLink};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Genome-wide context for one end of a result row, taken at the row's
/// own support and sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeDegreeAnnotation {
    /// Partners of this gene with at least the row's support.
    pub links: u32,
    /// Relative rank of this gene at the row's support.
    pub rank: f64,
}

/// One reported coexpression link, validated and ready for display.
///
/// Exactly one of `pos_supp` and `neg_supp` is nonzero, so the row's sign
/// can always be read back from which field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResultRow {
    /// The gene that was searched for.
    pub query_gene: GeneRef,
    /// The partner gene.
    pub found_gene: GeneRef,
    /// Whether the partner is itself one of the query genes.
    pub found_gene_is_query: bool,
    /// Experiments supporting a positive correlation.
    pub pos_supp: u32,
    /// Experiments supporting a negative correlation.
    pub neg_supp: u32,
    /// Experiments in which the pair was tested.
    pub num_tested_in: u32,
    /// The supporting experiments.
    pub supporting_experiment_ids: BTreeSet<ExperimentId>,
    /// One character per qualifying experiment, in ascending id order. See
    /// [`dataset_vector`].
    pub dataset_vector: String,
    /// Ordering key: higher support first, then found-gene symbol.
    pub sort_key: String,
    /// Node-degree context for the query gene, once annotated.
    pub query_gene_node_degree: Option<NodeDegreeAnnotation>,
    /// Node-degree context for the found gene, once annotated.
    pub found_gene_node_degree: Option<NodeDegreeAnnotation>,
}

impl ResultRow {
    /// Build a row from a raw link whose ends have been resolved.
    ///
    /// `experiments` are the experiments that qualified for the search; they
    /// fix the layout of the row's dataset vector. Returns `None` when the
    /// link carries no support, since such a row could not satisfy the
    /// one-sided support invariant.
    pub fn from_link(
        query_gene: GeneRef,
        found_gene: GeneRef,
        found_gene_is_query: bool,
        link: &RawLink,
        experiments: &BTreeSet<ExperimentId>,
    ) -> Option<Self> {
        let support = link.num_datasets_supporting;
        if support == 0 {
            return None;
        }
        let (pos_supp, neg_supp) = if link.is_positive_correlation {
            (support, 0)
        } else {
            (0, support)
        };
        let sort_key = sort_key_for(support, &found_gene.symbol);
        Some(Self {
            query_gene,
            found_gene,
            found_gene_is_query,
            pos_supp,
            neg_supp,
            num_tested_in: link.num_datasets_tested_in,
            supporting_experiment_ids: link.supporting_experiment_ids.clone(),
            dataset_vector: dataset_vector(link, experiments),
            sort_key,
            query_gene_node_degree: None,
            found_gene_node_degree: None,
        })
    }

    /// Number of supporting experiments, whichever the sign.
    pub fn support(&self) -> u32 {
        self.pos_supp.max(self.neg_supp)
    }

    /// Whether the row reports a positive correlation.
    pub const fn is_positive(&self) -> bool {
        self.neg_supp == 0
    }

    /// Whether `gene` is either end of this row.
    pub fn involves(&self, gene: GeneId) -> bool {
        self.query_gene.id == gene || self.found_gene.id == gene
    }
}

/// Per-experiment evidence for `link` as a string of digits, one per entry
/// of `experiments` in ascending id order.
///
/// `3` marks an experiment supporting the link, `1` one that tested the pair
/// without supporting it, and `0` one with no record of the pair. Evidence
/// is not split by measurement specificity, so the `2` used elsewhere for
/// non-specific support never appears.
pub fn dataset_vector(link: &RawLink, experiments: &BTreeSet<ExperimentId>) -> String {
    experiments
        .iter()
        .map(|id| {
            if link.supporting_experiment_ids.contains(id) {
                '3'
            } else if link.tested_in_experiment_ids.contains(id) {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

/// Sort key for a row: the reciprocal of `support` to three decimals, then
/// the found-gene symbol.
///
/// Ascending string order puts higher support first and breaks ties
/// alphabetically. Supports of about 667 and above share a reciprocal at
/// this precision.
pub fn sort_key_for(support: u32, found_symbol: &str) -> String {
    let reciprocal = 1.0 / f64::from(support.max(1));
    format!("{reciprocal:.3}_{found_symbol}")
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Per-query-gene aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Summary {
    /// The query gene summarised.
    pub gene_id: GeneId,
    /// Experiments that qualified for the search.
    pub datasets_available: usize,
    /// Most experiments any of the gene's links was tested in.
    pub datasets_tested: u32,
    /// Qualifying experiments in which the gene was tested, ascending. Only
    /// experiments named by one of the gene's raw links are known.
    pub datasets_tested_in: Vec<ExperimentId>,
    /// Raw links returned for the gene.
    pub links_found: usize,
    /// Raw links with positive correlation.
    pub positive_links: usize,
    /// Raw links with negative correlation.
    pub negative_links: usize,
    /// Genome-wide node degree, once annotated.
    pub node_degree: Option<GeneNodeDegree>,
}

impl Summary {
    /// Summarise the raw links returned for `gene_id` against the
    /// experiments that qualified for the search.
    pub fn from_links(
        gene_id: GeneId,
        experiments: &BTreeSet<ExperimentId>,
        links: &[RawLink],
    ) -> Self {
        let positive_links = links.iter().filter(|l| l.is_positive_correlation).count();
        let tested_in: BTreeSet<ExperimentId> = links
            .iter()
            .flat_map(RawLink::tested_experiments)
            .filter(|id| experiments.contains(id))
            .copied()
            .collect();
        Self {
            gene_id,
            datasets_available: experiments.len(),
            datasets_tested: links
                .iter()
                .map(|l| l.num_datasets_tested_in)
                .max()
                .unwrap_or(0),
            datasets_tested_in: tested_in.into_iter().collect(),
            links_found: links.len(),
            positive_links,
            negative_links: links.len().saturating_sub(positive_links),
            node_degree: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Something the engine noticed and worked around during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Diagnostic {
    /// A query-genes-only link had an end outside the query set.
    NonQueryGeneLink {
        /// Query gene of the dropped link.
        query_gene: GeneId,
        /// Found gene of the dropped link.
        found_gene: GeneId,
    },
    /// The found gene of a link could not be resolved.
    UnresolvedFoundGene {
        /// Query gene of the dropped link.
        query_gene: GeneId,
        /// The unresolvable gene id.
        found_gene: GeneId,
    },
    /// No links were found, so the minimum support was lowered.
    StringencyBackedOff {
        /// Stringency that produced nothing.
        from: u32,
        /// Stringency tried next.
        to: u32,
    },
    /// The node-degree pass ran slower than the configured threshold.
    SlowNodeDegreePass {
        /// Wall-clock time of the pass.
        elapsed_ms: u64,
    },
}

// ---------------------------------------------------------------------------
// Search result
// ---------------------------------------------------------------------------

/// The payload of a completed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SearchResult {
    /// Row budget applied by trimming.
    pub max_edges: usize,
    /// Experiments that qualified for the search.
    pub num_datasets_queried: usize,
    /// The resolved query genes.
    pub query_genes: Vec<GeneRef>,
    /// Whether the search ran in query-genes-only mode.
    pub query_genes_only: bool,
    /// Minimum support actually applied.
    pub query_stringency: u32,
    /// Result rows, ascending by sort key.
    pub results: Vec<ResultRow>,
    /// Per-query-gene summaries.
    pub summaries: BTreeMap<GeneId, Summary>,
    /// Inconsistencies and adjustments noticed along the way.
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::TaxonId;

    fn gene(id: u64, symbol: &str) -> GeneRef {
        GeneRef::new(GeneId::new(id), symbol, TaxonId::new(1))
    }

    fn link(support: u32, positive: bool) -> RawLink {
        RawLink {
            query_gene_id: GeneId::new(1),
            found_gene_id: GeneId::new(2),
            is_positive_correlation: positive,
            num_datasets_supporting: support,
            num_datasets_tested_in: 12,
            supporting_experiment_ids: BTreeSet::from([ExperimentId::new(5)]),
            tested_in_experiment_ids: BTreeSet::new(),
        }
    }

    fn experiments(raw: &[u64]) -> BTreeSet<ExperimentId> {
        raw.iter().copied().map(ExperimentId::new).collect()
    }

    fn build(link: &RawLink) -> Option<ResultRow> {
        ResultRow::from_link(gene(1, "A"), gene(2, "B"), false, link, &experiments(&[5]))
    }

    #[test]
    fn positive_link_sets_only_pos_supp() {
        let row = build(&link(4, true)).unwrap();
        assert_eq!((row.pos_supp, row.neg_supp), (4, 0));
        assert_eq!(row.support(), 4);
        assert!(row.is_positive());
    }

    #[test]
    fn negative_link_sets_only_neg_supp() {
        let row = build(&link(6, false)).unwrap();
        assert_eq!((row.pos_supp, row.neg_supp), (0, 6));
        assert_eq!(row.support(), 6);
        assert!(!row.is_positive());
    }

    #[test]
    fn zero_support_link_builds_no_row() {
        assert!(build(&link(0, true)).is_none());
    }

    #[test]
    fn higher_support_sorts_first() {
        assert!(sort_key_for(10, "ZZZ") < sort_key_for(5, "AAA"));
        assert_eq!(sort_key_for(10, "ACTB"), "0.100_ACTB");
    }

    #[test]
    fn equal_support_sorts_by_symbol() {
        assert!(sort_key_for(3, "ACTB") < sort_key_for(3, "GAPDH"));
    }

    #[test]
    fn summary_counts_links_by_sign() {
        let links = [link(3, true), link(2, false), link(4, true)];
        let summary = Summary::from_links(GeneId::new(1), &experiments(&[1, 2, 5, 7]), &links);
        assert_eq!(summary.links_found, 3);
        assert_eq!(summary.positive_links, 2);
        assert_eq!(summary.negative_links, 1);
        assert_eq!(summary.datasets_tested, 12);
        assert_eq!(summary.datasets_available, 4);
    }

    #[test]
    fn dataset_vector_marks_support_and_testing_per_experiment() {
        let mut l = link(2, true);
        l.supporting_experiment_ids = experiments(&[3, 8]);
        l.tested_in_experiment_ids = experiments(&[1, 3, 4]);
        assert_eq!(dataset_vector(&l, &experiments(&[1, 2, 3, 4, 8, 9])), "103130");
        assert_eq!(dataset_vector(&l, &BTreeSet::new()), "");

        let row = ResultRow::from_link(gene(1, "A"), gene(2, "B"), false, &l, &experiments(&[3, 4]))
            .unwrap();
        assert_eq!(row.dataset_vector, "31");
    }

    #[test]
    fn summary_lists_qualifying_experiments_the_gene_was_tested_in() {
        let mut first = link(2, true);
        first.supporting_experiment_ids = experiments(&[2, 6]);
        first.tested_in_experiment_ids = experiments(&[1, 2, 9]);
        let mut second = link(1, false);
        second.supporting_experiment_ids = experiments(&[4]);
        let summary =
            Summary::from_links(GeneId::new(1), &experiments(&[1, 2, 3, 4, 6]), &[first, second]);
        let tested: Vec<u64> = summary
            .datasets_tested_in
            .iter()
            .map(|id| id.into_inner())
            .collect();
        assert_eq!(tested, vec![1, 2, 4, 6]);
    }

    #[test]
    fn diagnostic_serializes_with_kind_tag() {
        let d = Diagnostic::StringencyBackedOff { from: 5, to: 2 };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "stringency_backed_off");
        assert_eq!(json["to"], 2);
    }
}
