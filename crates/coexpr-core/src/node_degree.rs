//! Genome-wide node-degree annotation of result rows and summaries.
//!
//! Statistics for every gene appearing in the final rows are fetched in one
//! bulk call. Each row end gets the link count and relative rank at the
//! row's own support and sign. The statistics are genome-wide and do not
//! depend on which experiments the search covered.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use coexpr_types::{Diagnostic, GeneId, GeneNodeDegree, NodeDegreeAnnotation, ResultRow, Summary};
use tracing::{debug, info};

use crate::collaborators::{CollaboratorError, NodeDegreeStats};
use crate::deadline::Deadline;

/// Annotate `rows` and `summaries` in place.
///
/// Rows whose ends do not both have statistics are left unannotated.
/// Returns a [`Diagnostic::SlowNodeDegreePass`] when the pass takes longer
/// than `slow_threshold`.
///
/// # Errors
///
/// Returns [`CollaboratorError`] if the bulk statistics call fails.
pub fn annotate(
    rows: &mut [ResultRow],
    summaries: &mut BTreeMap<GeneId, Summary>,
    stats: &dyn NodeDegreeStats,
    slow_threshold: Duration,
    deadline: &Deadline,
) -> Result<Option<Diagnostic>, CollaboratorError> {
    let started = Instant::now();

    let gene_ids: BTreeSet<GeneId> = rows
        .iter()
        .flat_map(|row| [row.query_gene.id, row.found_gene.id])
        .collect();
    if gene_ids.is_empty() {
        return Ok(None);
    }

    let degrees = stats.node_degrees(&gene_ids, deadline)?;

    let mut annotated: usize = 0;
    for row in rows.iter_mut() {
        let (Some(query_degree), Some(found_degree)) = (
            degrees.get(&row.query_gene.id),
            degrees.get(&row.found_gene.id),
        ) else {
            continue;
        };
        let support = row.support();
        let is_positive = row.is_positive();
        row.query_gene_node_degree = Some(annotation(query_degree, support, is_positive));
        row.found_gene_node_degree = Some(annotation(found_degree, support, is_positive));
        annotated = annotated.saturating_add(1);
    }

    for (gene_id, summary) in summaries.iter_mut() {
        if let Some(degree) = degrees.get(gene_id) {
            summary.node_degree = Some(degree.clone());
        }
    }

    let elapsed = started.elapsed();
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    debug!(
        genes = gene_ids.len(),
        rows = rows.len(),
        annotated,
        elapsed_ms,
        "Node degree population"
    );

    if elapsed > slow_threshold {
        info!(elapsed_ms, genes = gene_ids.len(), "Node degree population was slow");
        return Ok(Some(Diagnostic::SlowNodeDegreePass { elapsed_ms }));
    }
    Ok(None)
}

fn annotation(degree: &GeneNodeDegree, support: u32, is_positive: bool) -> NodeDegreeAnnotation {
    NodeDegreeAnnotation {
        links: degree.links_with_minimum_support(support, is_positive),
        rank: degree.rank_at_minimum_support(support, is_positive),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use coexpr_types::{GeneRef, RawLink, TaxonId};

    use super::*;

    struct Stats {
        known: BTreeMap<GeneId, GeneNodeDegree>,
        requests: Mutex<Vec<BTreeSet<GeneId>>>,
    }

    impl Stats {
        fn new(ids: &[u64]) -> Self {
            Self {
                known: ids.iter().map(|&id| (GeneId::new(id), degree(id))).collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl NodeDegreeStats for Stats {
        fn node_degrees(
            &self,
            ids: &BTreeSet<GeneId>,
            _deadline: &Deadline,
        ) -> Result<BTreeMap<GeneId, GeneNodeDegree>, CollaboratorError> {
            self.requests.lock().unwrap().push(ids.clone());
            Ok(ids
                .iter()
                .filter_map(|id| self.known.get(id).map(|d| (*id, d.clone())))
                .collect())
        }
    }

    fn degree(id: u64) -> GeneNodeDegree {
        GeneNodeDegree {
            gene_id: GeneId::new(id),
            positive_link_counts: vec![0, 20, 10, 5],
            negative_link_counts: vec![0, 8, 4, 2],
            positive_relative_ranks: vec![0.0, 0.8, 0.7, 0.6],
            negative_relative_ranks: vec![0.0, 0.3, 0.2, 0.1],
        }
    }

    fn row(query: u64, found: u64, support: u32, positive: bool) -> ResultRow {
        let taxon = TaxonId::new(1);
        let link = RawLink {
            query_gene_id: GeneId::new(query),
            found_gene_id: GeneId::new(found),
            is_positive_correlation: positive,
            num_datasets_supporting: support,
            num_datasets_tested_in: 4,
            supporting_experiment_ids: BTreeSet::new(),
            tested_in_experiment_ids: BTreeSet::new(),
        };
        ResultRow::from_link(
            GeneRef::new(GeneId::new(query), "Q", taxon),
            GeneRef::new(GeneId::new(found), "F", taxon),
            false,
            &link,
            &BTreeSet::new(),
        )
        .unwrap()
    }

    fn summaries(ids: &[u64]) -> BTreeMap<GeneId, Summary> {
        ids.iter()
            .map(|&id| {
                let gene_id = GeneId::new(id);
                (gene_id, Summary::from_links(gene_id, &BTreeSet::new(), &[]))
            })
            .collect()
    }

    #[test]
    fn annotates_both_ends_with_row_sign() {
        let stats = Stats::new(&[1, 2, 3]);
        let mut rows = vec![row(1, 2, 2, true), row(1, 3, 3, false)];
        let mut sums = summaries(&[1]);
        annotate(&mut rows, &mut sums, &stats, Duration::from_secs(60), &Deadline::none()).unwrap();

        let pos = rows[0].query_gene_node_degree.unwrap();
        assert_eq!(pos.links, 15);
        assert!((pos.rank - 0.7).abs() < f64::EPSILON);

        let neg = rows[1].found_gene_node_degree.unwrap();
        assert_eq!(neg.links, 2);
        assert!((neg.rank - 0.1).abs() < f64::EPSILON);

        assert_eq!(sums[&GeneId::new(1)].node_degree, Some(degree(1)));
    }

    #[test]
    fn fetches_all_genes_in_one_call() {
        let stats = Stats::new(&[1, 2, 3]);
        let mut rows = vec![row(1, 2, 2, true), row(1, 3, 2, true), row(2, 3, 2, true)];
        annotate(&mut rows, &mut summaries(&[]), &stats, Duration::from_secs(60), &Deadline::none())
            .unwrap();
        let requests = stats.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 3);
    }

    #[test]
    fn rows_missing_partner_stats_are_kept_unannotated() {
        let stats = Stats::new(&[1]);
        let mut rows = vec![row(1, 2, 2, true)];
        annotate(&mut rows, &mut summaries(&[1]), &stats, Duration::from_secs(60), &Deadline::none())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].query_gene_node_degree.is_none());
        assert!(rows[0].found_gene_node_degree.is_none());
    }

    #[test]
    fn empty_rows_make_no_call() {
        let stats = Stats::new(&[1]);
        let out = annotate(&mut [], &mut summaries(&[1]), &stats, Duration::ZERO, &Deadline::none())
            .unwrap();
        assert!(out.is_none());
        assert!(stats.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_threshold_flags_the_pass_as_slow() {
        let stats = Stats::new(&[1, 2]);
        let mut rows = vec![row(1, 2, 1, true)];
        let out = annotate(&mut rows, &mut summaries(&[]), &stats, Duration::ZERO, &Deadline::none())
            .unwrap();
        assert!(matches!(out, Some(Diagnostic::SlowNodeDegreePass { .. })));
    }
}
