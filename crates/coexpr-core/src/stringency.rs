//! Initial minimum-support selection.
//!
//! Larger gene panels and larger experiment corpora justify a higher
//! minimum-support floor to keep result volume tractable. Query-genes-only
//! searches tolerate a slightly lower floor because their result space is
//! already bounded by the gene set.
//!
//! The rule, with `E` experiments and `G` genes:
//! - `E < 5`: `min(E, 2)`
//! - `baseline = ceil(1 + G / 100)`; if `baseline > E` the answer is `E`
//! - query-genes-only lowers `baseline` by one
//! - result: `ceil(baseline + E / 20)`

/// Below this many experiments the small-corpus rule applies.
const SMALL_CORPUS: usize = 5;

/// Choose a starting minimum support for a search. Never returns less than 1.
pub fn choose_stringency(
    query_genes_only: bool,
    num_experiments_queried: usize,
    num_genes_queried: usize,
) -> u32 {
    if num_experiments_queried < SMALL_CORPUS {
        return to_stringency(num_experiments_queried.min(2));
    }

    let mut baseline = num_genes_queried.div_ceil(100).saturating_add(1);
    if baseline > num_experiments_queried {
        return to_stringency(num_experiments_queried);
    }

    if query_genes_only {
        baseline = baseline.saturating_sub(1);
    }

    to_stringency(baseline.saturating_add(num_experiments_queried.div_ceil(20)))
}

fn to_stringency(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_corpus_caps_at_two() {
        assert_eq!(choose_stringency(false, 3, 5), 2);
        assert_eq!(choose_stringency(true, 4, 500), 2);
    }

    #[test]
    fn single_experiment_gives_one() {
        assert_eq!(choose_stringency(false, 1, 1), 1);
    }

    #[test]
    fn empty_corpus_still_returns_at_least_one() {
        assert_eq!(choose_stringency(false, 0, 3), 1);
    }

    #[test]
    fn large_corpus_scales_with_experiments() {
        assert_eq!(choose_stringency(false, 1000, 10), 52);
    }

    #[test]
    fn query_genes_only_lowers_by_one() {
        assert_eq!(choose_stringency(true, 1000, 10), 51);
    }

    #[test]
    fn large_panel_raises_baseline() {
        // baseline = 1 + ceil(250 / 100) = 4; 4 + ceil(100 / 20) = 9
        assert_eq!(choose_stringency(false, 100, 250), 9);
    }

    #[test]
    fn baseline_above_corpus_returns_corpus_size() {
        // baseline = 1 + ceil(900 / 100) = 10 > 6
        assert_eq!(choose_stringency(false, 6, 900), 6);
    }

    #[test]
    fn fractional_terms_round_up() {
        // baseline = 1 + ceil(1 / 100) = 2; 2 + ceil(21 / 20) = 4
        assert_eq!(choose_stringency(false, 21, 1), 4);
    }
}
