//! Conversion of raw links into validated result rows for one query gene.
//!
//! Found genes are resolved in a single batch lookup rather than one lookup
//! per link. Links that cannot be turned into a valid row are dropped and
//! reported as [`Diagnostic`]s; a bad link never aborts the search.

use std::collections::{BTreeMap, BTreeSet};

use coexpr_types::{Diagnostic, ExperimentId, GeneId, GeneRef, RawLink, ResultRow};
use tracing::{debug, warn};

use crate::collaborators::{CollaboratorError, GeneMetadata};
use crate::deadline::Deadline;

/// Rows built for one query gene, plus whatever was dropped along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    /// Valid rows, in raw-link order.
    pub rows: Vec<ResultRow>,
    /// One entry per dropped link.
    pub diagnostics: Vec<Diagnostic>,
}

/// Build result rows for `query_gene` from its raw links.
///
/// In query-genes-only mode, links with an end outside `query_gene_ids` are
/// dropped. Links whose found gene no longer resolves are dropped. Links
/// with zero support carry no evidence and are skipped silently. Each row's
/// dataset vector is laid out over `experiments`.
///
/// # Errors
///
/// Returns [`CollaboratorError`] if the batch gene lookup fails.
pub fn assemble(
    query_gene: &GeneRef,
    raw_links: &[RawLink],
    query_genes_only: bool,
    query_gene_ids: &BTreeSet<GeneId>,
    experiments: &BTreeSet<ExperimentId>,
    genes: &dyn GeneMetadata,
    deadline: &Deadline,
) -> Result<Assembly, CollaboratorError> {
    let found_ids: BTreeSet<GeneId> = raw_links.iter().map(|l| l.found_gene_id).collect();
    let found_genes = if found_ids.is_empty() {
        BTreeMap::new()
    } else {
        genes.load_by_ids(&found_ids, deadline)?
    };

    let mut assembly = Assembly::default();

    for link in raw_links {
        if query_genes_only
            && !(query_gene_ids.contains(&link.query_gene_id)
                && query_gene_ids.contains(&link.found_gene_id))
        {
            warn!(
                query_gene = %link.query_gene_id,
                found_gene = %link.found_gene_id,
                "Query-genes-only link references a gene outside the query set; dropping"
            );
            assembly.diagnostics.push(Diagnostic::NonQueryGeneLink {
                query_gene: link.query_gene_id,
                found_gene: link.found_gene_id,
            });
            continue;
        }

        let Some(found_gene) = found_genes.get(&link.found_gene_id) else {
            warn!(
                query_gene = %link.query_gene_id,
                found_gene = %link.found_gene_id,
                "Found gene could not be resolved; dropping link"
            );
            assembly.diagnostics.push(Diagnostic::UnresolvedFoundGene {
                query_gene: link.query_gene_id,
                found_gene: link.found_gene_id,
            });
            continue;
        };

        let is_query = query_gene_ids.contains(&found_gene.id);
        match ResultRow::from_link(
            query_gene.clone(),
            found_gene.clone(),
            is_query,
            link,
            experiments,
        ) {
            Some(row) => assembly.rows.push(row),
            None => debug!(
                query_gene = %link.query_gene_id,
                found_gene = %link.found_gene_id,
                "Skipping link with zero support"
            ),
        }
    }

    Ok(assembly)
}
