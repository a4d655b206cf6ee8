//! Request pipeline for one collection directory.
//!
//! ```text
//! challenge1b_input.json ─▶ load_request ─▶ extract_documents (parallel, blocking pool)
//!                                                   │
//!                                                   ▼
//!                          Pipeline::rank ─▶ resolve ─▶ score ─▶ select ─▶ assemble
//!                                                   │
//!                                                   ▼
//!                                        challenge1b_output.json
//! ```
//!
//! Extraction failures skip the document. Request and oracle failures abort
//! the run and no output file is written.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shortlist_core::bias::BiasDomain;
use shortlist_core::embedding::{EmbeddingOracle, SimilarityOracle};
use shortlist_core::label::Summarizer;
use shortlist_core::score::RelevanceScorer;
use shortlist_core::select::CategorySelector;
use shortlist_core::store::PassageStore;
use shortlist_core::taxonomy::{TaxonomyResolver, TaxonomyRule};

use crate::assemble::{assemble, processing_timestamp, write_result, ResultDocument};
use crate::config::{Config, CustomTaxonomyConfig};
use crate::embedding::create_embedder;
use crate::extract::extract_file;
use crate::labels::create_summarizer;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::request::{load_request, RequestDocument};

/// Built-in resolver with the configured taxonomies ahead of it.
///
/// Earlier entries in the config take priority over later ones, and every
/// custom entry takes priority over the built-in table.
pub fn build_resolver(custom: &[CustomTaxonomyConfig]) -> TaxonomyResolver {
    let mut resolver = TaxonomyResolver::builtin();
    for entry in custom.iter().rev() {
        let taxonomy = entry.to_taxonomy();
        for id in entry.request_ids.iter().rev() {
            resolver = resolver.with_override_first(id, taxonomy.clone());
        }
        if !entry.keywords.is_empty() {
            let keywords: Vec<&str> = entry.keywords.iter().map(String::as_str).collect();
            resolver = resolver.with_rule_at(0, TaxonomyRule::new(&keywords, taxonomy));
        }
    }
    resolver
}

/// Extract every requested document into one store, in request order.
///
/// Documents are parsed concurrently on the blocking pool. Missing or
/// unreadable documents are reported and skipped.
pub async fn extract_documents(
    request: &RequestDocument,
    documents_dir: &Path,
    min_passage_chars: usize,
    progress: &dyn ProgressReporter,
) -> PassageStore {
    let filenames = request.filenames();
    let total = filenames.len() as u64;

    let handles: Vec<_> = filenames
        .iter()
        .map(|name| {
            let path = documents_dir.join(name);
            tokio::task::spawn_blocking(move || {
                if !path.is_file() {
                    return None;
                }
                Some(extract_file(&path, min_passage_chars))
            })
        })
        .collect();

    let mut store = PassageStore::new();
    for (i, (name, handle)) in filenames.into_iter().zip(handles).enumerate() {
        progress.report(ProgressEvent::Parsing {
            document: name.clone(),
            n: i as u64 + 1,
            total,
        });

        let reason = match handle.await {
            Ok(Some(Ok(raw))) => {
                let added = store.add_document(name.as_str(), raw);
                tracing::debug!(document = %name, passages = added, "extracted");
                continue;
            }
            Ok(Some(Err(e))) => e.to_string(),
            Ok(None) => "not found".to_string(),
            Err(e) => format!("extraction task failed: {}", e),
        };
        tracing::warn!(document = %name, %reason, "skipping document");
        progress.report(ProgressEvent::Skipped {
            document: name,
            reason,
        });
    }
    store
}

/// The synchronous half of a run: everything after extraction.
pub struct Pipeline<'a> {
    pub resolver: &'a TaxonomyResolver,
    pub oracle: &'a dyn SimilarityOracle,
    pub summarizer: &'a dyn Summarizer,
    pub label_chars: usize,
    pub progress: &'a dyn ProgressReporter,
    /// Processing timestamp source, read once selection has finished.
    pub clock: &'a dyn Fn() -> String,
}

impl Pipeline<'_> {
    /// Resolve, score, select, and assemble. Oracle errors are fatal.
    pub fn rank(
        &self,
        request: &RequestDocument,
        store: &mut PassageStore,
    ) -> Result<ResultDocument> {
        let ctx = request.context();
        let taxonomy = self
            .resolver
            .resolve(&ctx.request_id, &ctx.persona, &ctx.task);
        tracing::info!(
            taxonomy = %taxonomy.name,
            passages = store.len(),
            request_id = %ctx.request_id,
            test_case = request.test_case_name().unwrap_or("-"),
            "ranking passages"
        );
        if let Some(domain) = BiasDomain::detect(&ctx.request_id, &ctx.task) {
            tracing::info!(domain = domain.as_str(), "source bias active");
        }
        self.progress.report(ProgressEvent::Ranking {
            taxonomy: taxonomy.name.clone(),
            passages: store.len() as u64,
            categories: taxonomy.len() as u64,
        });

        let scorer = RelevanceScorer::new(self.oracle);
        scorer.score_task_relevance(store.passages_mut(), &ctx.task)?;

        let selection = CategorySelector::new(&scorer).select(
            store.passages(),
            &ctx.task,
            taxonomy,
            &ctx.request_id,
        )?;
        tracing::info!(
            selected = selection.len(),
            categories = taxonomy.len(),
            "selection complete"
        );

        let timestamp = (self.clock)();
        Ok(assemble(
            request,
            &selection,
            self.summarizer,
            self.label_chars,
            timestamp,
        ))
    }
}

/// Process one collection directory and write its result document.
///
/// Returns the path of the written output file.
pub async fn run_collection(
    config: &Config,
    collection_dir: &Path,
    progress: Arc<dyn ProgressReporter>,
) -> Result<PathBuf> {
    let request = load_request(&collection_dir.join(&config.extraction.input_file))?;
    let documents_dir = collection_dir.join(&config.extraction.documents_dir);
    let mut store = extract_documents(
        &request,
        &documents_dir,
        config.extraction.min_passage_chars,
        progress.as_ref(),
    )
    .await;

    let resolver = build_resolver(&config.taxonomies);
    let embedding_config = config.embedding.clone();
    let label_config = config.labels.clone();
    let reporter = Arc::clone(&progress);

    // Model loading, HTTP providers, and scoring all block.
    let result = tokio::task::spawn_blocking(move || -> Result<ResultDocument> {
        let oracle = EmbeddingOracle::new(create_embedder(&embedding_config)?);
        let summarizer = create_summarizer(&label_config)?;
        let pipeline = Pipeline {
            resolver: &resolver,
            oracle: &oracle,
            summarizer: summarizer.as_ref(),
            label_chars: label_config.max_chars,
            progress: reporter.as_ref(),
            clock: &processing_timestamp,
        };
        pipeline.rank(&request, &mut store)
    })
    .await
    .context("ranking task failed")??;

    let output = collection_dir.join(&config.extraction.output_file);
    write_result(&output, &result)?;
    progress.report(ProgressEvent::Done {
        output: output.clone(),
    });
    Ok(output)
}
