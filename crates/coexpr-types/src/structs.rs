//! Records handed to the engine by its collaborators.
//!
//! [`GeneRef`] comes from the gene-metadata store, [`RawLink`] from the
//! coexpression link store, and [`GeneNodeDegree`] from the genome-wide
//! node-degree statistics. The engine reads these but never owns their
//! source of truth.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ExperimentId, GeneId, TaxonId};

// ---------------------------------------------------------------------------
// Genes
// ---------------------------------------------------------------------------

/// A gene as reported by the gene-metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeneRef {
    /// Store identifier.
    pub id: GeneId,
    /// Official gene symbol (e.g. `GRIN1`).
    pub symbol: String,
    /// Official full name, when the store has one.
    #[serde(default)]
    pub official_name: Option<String>,
    /// Taxon the gene belongs to.
    pub taxon: TaxonId,
}

impl GeneRef {
    /// Create a gene reference without an official name.
    pub fn new(id: GeneId, symbol: impl Into<String>, taxon: TaxonId) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            official_name: None,
            taxon,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw links
// ---------------------------------------------------------------------------

/// One coexpression link between a query gene and a found gene.
///
/// A link reports support in exactly one correlation direction. Evidence
/// for the opposite sign between the same pair is a separate `RawLink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RawLink {
    /// The gene the search was issued for.
    pub query_gene_id: GeneId,
    /// The partner gene.
    pub found_gene_id: GeneId,
    /// Whether the supporting experiments saw a positive correlation.
    pub is_positive_correlation: bool,
    /// Number of experiments supporting the link.
    pub num_datasets_supporting: u32,
    /// Number of experiments in which the pair could be tested at all.
    pub num_datasets_tested_in: u32,
    /// The experiments that support the link.
    #[serde(default)]
    pub supporting_experiment_ids: BTreeSet<ExperimentId>,
    /// The experiments in which the pair was tested, when the store
    /// reports them. Supporting experiments may or may not be repeated here.
    #[serde(default)]
    pub tested_in_experiment_ids: BTreeSet<ExperimentId>,
}

impl RawLink {
    /// Every experiment known to have tested the pair, supporting ones
    /// included.
    pub fn tested_experiments(&self) -> impl Iterator<Item = &ExperimentId> {
        self.tested_in_experiment_ids
            .union(&self.supporting_experiment_ids)
    }
}

// ---------------------------------------------------------------------------
// Node degree
// ---------------------------------------------------------------------------

/// Genome-wide node-degree statistics for one gene.
///
/// Counts and ranks are indexed by exact support level: `positive_link_counts[s]`
/// is the number of positively correlated partners seen in exactly `s`
/// experiments, and `positive_relative_ranks[s]` is the gene's relative rank
/// (0.0 to 1.0) among all genes when links below support `s` are ignored.
/// Index 0 is unused. The statistics do not depend on which experiments a
/// particular search covered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeneNodeDegree {
    /// The gene these statistics describe.
    pub gene_id: GeneId,
    /// Positive link counts per exact support level.
    #[serde(default)]
    pub positive_link_counts: Vec<u32>,
    /// Negative link counts per exact support level.
    #[serde(default)]
    pub negative_link_counts: Vec<u32>,
    /// Relative rank among genes at each positive minimum support.
    #[serde(default)]
    pub positive_relative_ranks: Vec<f64>,
    /// Relative rank among genes at each negative minimum support.
    #[serde(default)]
    pub negative_relative_ranks: Vec<f64>,
}

impl GeneNodeDegree {
    /// Number of partners linked to this gene with at least `support`
    /// supporting experiments in the given direction.
    pub fn links_with_minimum_support(&self, support: u32, is_positive: bool) -> u32 {
        let counts = if is_positive {
            &self.positive_link_counts
        } else {
            &self.negative_link_counts
        };
        counts
            .iter()
            .skip(level_index(support))
            .fold(0_u32, |total, &count| total.saturating_add(count))
    }

    /// Relative rank of this gene when only links with at least `support`
    /// experiments in the given direction are counted.
    ///
    /// Returns 0.0 beyond the recorded support range.
    pub fn rank_at_minimum_support(&self, support: u32, is_positive: bool) -> f64 {
        let ranks = if is_positive {
            &self.positive_relative_ranks
        } else {
            &self.negative_relative_ranks
        };
        ranks.get(level_index(support)).copied().unwrap_or(0.0)
    }
}

fn level_index(support: u32) -> usize {
    usize::try_from(support).unwrap_or(usize::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn degree() -> GeneNodeDegree {
        GeneNodeDegree {
            gene_id: GeneId::new(1),
            positive_link_counts: vec![0, 10, 5, 2],
            negative_link_counts: vec![0, 4, 1],
            positive_relative_ranks: vec![0.0, 0.9, 0.6, 0.25],
            negative_relative_ranks: vec![0.0, 0.5, 0.1],
        }
    }

    #[test]
    fn links_are_cumulative_from_minimum_support() {
        let d = degree();
        assert_eq!(d.links_with_minimum_support(1, true), 17);
        assert_eq!(d.links_with_minimum_support(2, true), 7);
        assert_eq!(d.links_with_minimum_support(3, true), 2);
        assert_eq!(d.links_with_minimum_support(2, false), 1);
    }

    #[test]
    fn links_beyond_range_are_zero() {
        assert_eq!(degree().links_with_minimum_support(40, true), 0);
    }

    #[test]
    fn rank_reads_the_requested_sign() {
        let d = degree();
        assert!((d.rank_at_minimum_support(2, true) - 0.6).abs() < f64::EPSILON);
        assert!((d.rank_at_minimum_support(2, false) - 0.1).abs() < f64::EPSILON);
        assert!(d.rank_at_minimum_support(9, false).abs() < f64::EPSILON);
    }

    #[test]
    fn raw_link_defaults_missing_experiments() {
        let json = r#"{
            "query_gene_id": 1,
            "found_gene_id": 2,
            "is_positive_correlation": true,
            "num_datasets_supporting": 3,
            "num_datasets_tested_in": 8
        }"#;
        let link: Result<RawLink, _> = serde_json::from_str(json);
        assert!(link.is_ok());
        assert!(link.ok().is_some_and(|l| {
            l.supporting_experiment_ids.is_empty() && l.tested_in_experiment_ids.is_empty()
        }));
    }

    #[test]
    fn tested_experiments_include_supporting_ones() {
        let json = r#"{
            "query_gene_id": 1,
            "found_gene_id": 2,
            "is_positive_correlation": false,
            "num_datasets_supporting": 2,
            "num_datasets_tested_in": 3,
            "supporting_experiment_ids": [4, 9],
            "tested_in_experiment_ids": [2, 4]
        }"#;
        let link: RawLink = serde_json::from_str(json).unwrap();
        let tested: Vec<u64> = link
            .tested_experiments()
            .map(|id| id.into_inner())
            .collect();
        assert_eq!(tested, vec![2, 4, 9]);
    }
}
