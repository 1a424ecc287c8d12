//! Capping the result set to a row budget.
//!
//! Trimming is a single cutoff adjustment over rows already sorted by
//! descending support. Once the budget is reached, the support of the row
//! that reached it becomes the new cutoff, and every later row at or above
//! that support is still kept. When many rows tie at the boundary support
//! the result can exceed the budget; callers rely on that behavior, so it
//! is kept as is.

use std::collections::BTreeMap;

use coexpr_types::{GeneId, ResultRow, Summary};

/// Rows that survived trimming and the minimum support they imply.
#[derive(Debug, Clone, PartialEq)]
pub struct Trimmed {
    /// Surviving rows, in input order.
    pub kept: Vec<ResultRow>,
    /// Minimum support actually applied; never below the input floor.
    pub effective_stringency: u32,
}

/// Trim `sorted_rows` towards `max_edges` rows.
///
/// Rows must already be sorted by descending support. Rows below
/// `stringency_floor` are never kept once trimming is needed. A budget of
/// zero keeps nothing.
///
/// Row order comes from [`ResultRow::sort_key`], which holds the reciprocal
/// support to three decimals. From a support of about 667 upward those
/// reciprocals all print as `0.001` or `0.000`, so rows with different
/// support can end up ordered by found-gene symbol alone. The cutoff is
/// then taken from whichever row happens to fill the budget.
pub fn trim(sorted_rows: Vec<ResultRow>, stringency_floor: u32, max_edges: usize) -> Trimmed {
    if sorted_rows.len() <= max_edges {
        return Trimmed {
            kept: sorted_rows,
            effective_stringency: stringency_floor,
        };
    }
    if max_edges == 0 {
        return Trimmed {
            kept: Vec::new(),
            effective_stringency: stringency_floor,
        };
    }

    let mut cutoff = stringency_floor;
    let mut cutoff_raised = false;
    let mut kept = Vec::with_capacity(max_edges);

    for row in sorted_rows {
        let support = row.support();
        if support < cutoff {
            continue;
        }
        kept.push(row);
        if !cutoff_raised && kept.len() == max_edges {
            cutoff = support;
            cutoff_raised = true;
        }
    }

    Trimmed {
        kept,
        effective_stringency: cutoff,
    }
}

/// Drop summaries whose gene is no longer an end of any kept row.
pub fn prune_summaries(summaries: &mut BTreeMap<GeneId, Summary>, kept: &[ResultRow]) {
    summaries.retain(|gene_id, _| kept.iter().any(|row| row.involves(*gene_id)));
}
