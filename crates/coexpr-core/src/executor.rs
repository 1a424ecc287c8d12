//! The coexpression search orchestrator.
//!
//! [`CoexpressionQueryExecutor::search`] runs one search end to end:
//!
//! 1. Reject empty gene sets without touching any collaborator
//! 2. Resolve the query genes and their (single) taxon
//! 3. Fetch the qualifying experiments
//! 4. Decide query-genes-only mode and the starting stringency
//! 5. Query the link store, backing off the stringency while nothing is found
//! 6. Assemble rows per query gene, then sort them
//! 7. Trim to the row budget (unless the caller asked for query genes only)
//! 8. Annotate rows and summaries with genome-wide node degrees
//!
//! The executor holds no state between calls. Everything it builds belongs
//! to the returned [`SearchOutcome`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use coexpr_types::{
    Diagnostic, ExperimentId, GeneId, GeneRef, ResultRow, SearchOutcome, SearchRejection,
    SearchRequest, SearchResult, Summary, TaxonId,
};
use tracing::{debug, info};

use crate::assembler;
use crate::collaborators::{CollaboratorError, Collaborators, LinkQuery, LinksByGene};
use crate::config::SearchConfig;
use crate::deadline::Deadline;
use crate::node_degree;
use crate::stringency::choose_stringency;
use crate::trimmer;

/// Errors that abort a search.
///
/// Caller-input problems are not errors; they come back as
/// [`SearchOutcome::Rejected`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A collaborator failed.
    #[error("collaborator error: {source}")]
    Collaborator {
        /// The underlying collaborator error.
        source: CollaboratorError,
    },

    /// The search ran out of time.
    #[error("search deadline exceeded")]
    DeadlineExceeded,

    /// An internal guard was bypassed. Indicates a bug upstream of the
    /// failing step.
    #[error("invariant violated: {message}")]
    InvariantViolation {
        /// What was violated.
        message: String,
    },
}

impl From<CollaboratorError> for SearchError {
    fn from(source: CollaboratorError) -> Self {
        match source {
            CollaboratorError::DeadlineExceeded => Self::DeadlineExceeded,
            other => Self::Collaborator { source: other },
        }
    }
}

/// Why a search stopped before producing a result.
enum Halt {
    Rejected(SearchRejection),
    Failed(SearchError),
}

impl From<SearchError> for Halt {
    fn from(error: SearchError) -> Self {
        Self::Failed(error)
    }
}

impl From<CollaboratorError> for Halt {
    fn from(error: CollaboratorError) -> Self {
        Self::Failed(SearchError::from(error))
    }
}

/// Resolved query genes sharing one taxon.
struct QueryGenes {
    taxon: TaxonId,
    genes: Vec<GeneRef>,
}

/// Runs coexpression searches against a set of collaborators.
#[derive(Debug, Clone)]
pub struct CoexpressionQueryExecutor<'a> {
    config: SearchConfig,
    collaborators: Collaborators<'a>,
}

impl<'a> CoexpressionQueryExecutor<'a> {
    /// Create an executor with the given tuning and collaborators.
    pub const fn new(config: SearchConfig, collaborators: Collaborators<'a>) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// The tuning this executor runs with.
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a search under the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if a collaborator fails, the timeout passes,
    /// or an internal invariant is violated.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let deadline = Deadline::from_budget(self.config.search_timeout());
        self.search_with_deadline(request, &deadline)
    }

    /// Run a search under a caller-supplied deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if a collaborator fails, the deadline passes,
    /// or an internal invariant is violated.
    pub fn search_with_deadline(
        &self,
        request: &SearchRequest,
        deadline: &Deadline,
    ) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        match self.run(request, deadline) {
            Ok(result) => {
                info!(
                    rows = result.results.len(),
                    summaries = result.summaries.len(),
                    stringency = result.query_stringency,
                    query_genes_only = result.query_genes_only,
                    diagnostics = result.diagnostics.len(),
                    elapsed_ms = millis(started.elapsed()),
                    "Coexpression search complete"
                );
                Ok(SearchOutcome::Completed(Box::new(result)))
            }
            Err(Halt::Rejected(reason)) => {
                info!(reason = %reason, "Coexpression search rejected");
                Ok(SearchOutcome::Rejected(reason))
            }
            Err(Halt::Failed(error)) => Err(error),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn run(&self, request: &SearchRequest, deadline: &Deadline) -> Result<SearchResult, Halt> {
        if request.gene_ids.is_empty() {
            return Err(Halt::Rejected(SearchRejection::NoGenesSelected));
        }

        let query = self.resolve_query_genes(&request.gene_ids, deadline)?;

        let experiments = self.collaborators.experiments.qualifying_experiments(
            request.experiment_ids.as_ref(),
            query.taxon,
            deadline,
        )?;
        if experiments.is_empty() {
            return Err(Halt::Rejected(SearchRejection::NoExperimentsSelected));
        }

        let num_genes = request.gene_ids.len();
        let query_genes_only = (request.query_genes_only && num_genes >= 2)
            || num_genes > self.config.panel_size_cutoff;
        if query_genes_only != request.query_genes_only {
            info!(
                num_genes,
                requested = request.query_genes_only,
                applied = query_genes_only,
                "Query-genes-only mode adjusted for panel size"
            );
        }

        let mut stringency = request.stringency.max(1);
        if !request.query_genes_only {
            let heuristic = choose_stringency(query_genes_only, experiments.len(), num_genes);
            stringency = stringency.max(heuristic);
        }

        info!(
            taxon = %query.taxon,
            num_genes,
            num_experiments = experiments.len(),
            stringency,
            query_genes_only,
            quick = request.quick,
            "Starting coexpression search"
        );

        let mut diagnostics = Vec::new();
        let (links, stringency) = self.find_links_with_backoff(
            &LinkQuery {
                taxon: query.taxon,
                gene_ids: &request.gene_ids,
                experiment_ids: &experiments,
                min_support: stringency,
                quick: request.quick,
            },
            query_genes_only,
            request.max_results_per_gene,
            &mut diagnostics,
            deadline,
        )?;

        let (mut rows, mut summaries) = self.assemble_rows(
            &query.genes,
            &links,
            query_genes_only,
            &request.gene_ids,
            &experiments,
            &mut diagnostics,
            deadline,
        )?;
        rows.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        let mut query_stringency = stringency;
        if !request.query_genes_only {
            let budget_exceeded = rows.len() > self.config.max_edges;
            let before = rows.len();
            let trimmed = trimmer::trim(rows, stringency, self.config.max_edges);
            rows = trimmed.kept;
            query_stringency = trimmed.effective_stringency;
            if budget_exceeded {
                trimmer::prune_summaries(&mut summaries, &rows);
                info!(
                    before,
                    after = rows.len(),
                    max_edges = self.config.max_edges,
                    stringency = query_stringency,
                    "Trimmed results to row budget"
                );
            }
        }

        deadline.check()?;
        let slow = Duration::from_millis(self.config.node_degree_slow_ms);
        if let Some(diagnostic) = node_degree::annotate(
            &mut rows,
            &mut summaries,
            self.collaborators.node_degrees,
            slow,
            deadline,
        )? {
            diagnostics.push(diagnostic);
        }

        Ok(SearchResult {
            max_edges: self.config.max_edges,
            num_datasets_queried: experiments.len(),
            query_genes: query.genes,
            query_genes_only,
            query_stringency,
            results: rows,
            summaries,
            diagnostics,
        })
    }

    /// Resolve every query gene and check they share one taxon.
    fn resolve_query_genes(
        &self,
        gene_ids: &BTreeSet<GeneId>,
        deadline: &Deadline,
    ) -> Result<QueryGenes, Halt> {
        let resolved = self.collaborators.genes.load_by_ids(gene_ids, deadline)?;

        let missing: Vec<GeneId> = gene_ids
            .iter()
            .filter(|id| !resolved.contains_key(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Halt::Rejected(SearchRejection::UnknownGenes { gene_ids: missing }));
        }

        let mut taxa: BTreeMap<TaxonId, Vec<GeneId>> = BTreeMap::new();
        for gene in resolved.values() {
            taxa.entry(gene.taxon).or_default().push(gene.id);
        }
        if taxa.len() > 1 {
            return Err(Halt::Rejected(SearchRejection::MixedTaxa { taxa }));
        }
        let Some(&taxon) = taxa.keys().next() else {
            return Err(Halt::Failed(SearchError::InvariantViolation {
                message: String::from("query genes resolved to no taxon"),
            }));
        };

        Ok(QueryGenes {
            taxon,
            genes: resolved.into_values().collect(),
        })
    }

    /// Query the link store, lowering the stringency while nothing comes back.
    ///
    /// Each retry lowers the stringency by the configured step, never below
    /// the floor, so the loop runs at most
    /// `ceil((initial - floor) / step) + 1` times.
    fn find_links_with_backoff(
        &self,
        query: &LinkQuery<'_>,
        query_genes_only: bool,
        max_results_per_gene: usize,
        diagnostics: &mut Vec<Diagnostic>,
        deadline: &Deadline,
    ) -> Result<(LinksByGene, u32), SearchError> {
        let floor = self.config.stringency_floor;
        let step = self.config.effective_backoff_step();
        let mut attempt = *query;

        loop {
            deadline.check()?;
            let links = self.query_links(&attempt, query_genes_only, max_results_per_gene, deadline)?;
            let found = links.values().map(Vec::len).sum::<usize>();
            debug!(stringency = attempt.min_support, found, "Link store queried");

            if found > 0 || attempt.min_support <= floor {
                return Ok((links, attempt.min_support));
            }

            let next = attempt.min_support.saturating_sub(step).max(floor);
            info!(
                from = attempt.min_support,
                to = next,
                "No links found; lowering stringency"
            );
            diagnostics.push(Diagnostic::StringencyBackedOff {
                from: attempt.min_support,
                to: next,
            });
            attempt.min_support = next;
        }
    }

    fn query_links(
        &self,
        query: &LinkQuery<'_>,
        query_genes_only: bool,
        max_results_per_gene: usize,
        deadline: &Deadline,
    ) -> Result<LinksByGene, SearchError> {
        let store = self.collaborators.links;
        if query_genes_only {
            if query.gene_ids.len() < 2 {
                return Err(SearchError::InvariantViolation {
                    message: format!(
                        "query-genes-only search needs at least two genes, got {}",
                        query.gene_ids.len()
                    ),
                });
            }
            Ok(store.find_inter_coexpression_relationships(query, deadline)?)
        } else {
            Ok(store.find_coexpression_relationships(query, max_results_per_gene, deadline)?)
        }
    }

    /// Build rows and a summary for every query gene that has links.
    #[allow(clippy::too_many_arguments)]
    fn assemble_rows(
        &self,
        query_genes: &[GeneRef],
        links: &LinksByGene,
        query_genes_only: bool,
        query_gene_ids: &BTreeSet<GeneId>,
        experiments: &BTreeSet<ExperimentId>,
        diagnostics: &mut Vec<Diagnostic>,
        deadline: &Deadline,
    ) -> Result<(Vec<ResultRow>, BTreeMap<GeneId, Summary>), SearchError> {
        let mut rows = Vec::new();
        let mut summaries = BTreeMap::new();

        for gene in query_genes {
            let Some(raw_links) = links.get(&gene.id).filter(|l| !l.is_empty()) else {
                continue;
            };
            let assembly = assembler::assemble(
                gene,
                raw_links,
                query_genes_only,
                query_gene_ids,
                experiments,
                self.collaborators.genes,
                deadline,
            )?;
            debug!(
                gene = %gene.symbol,
                raw = raw_links.len(),
                rows = assembly.rows.len(),
                dropped = assembly.diagnostics.len(),
                "Assembled rows for query gene"
            );
            rows.extend(assembly.rows);
            diagnostics.extend(assembly.diagnostics);
            summaries.insert(gene.id, Summary::from_links(gene.id, experiments, raw_links));
        }

        Ok((rows, summaries))
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
