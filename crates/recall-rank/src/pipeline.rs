//! End-to-end hybrid search orchestration.
//!
//! Embeds the query, over-fetches vector candidates, merges the optional
//! lexical signal, fuses, diversifies and finally enriches results with
//! content previews. Every collaborator is injected; the pipeline holds no
//! state of its own.

use std::sync::Arc;

use recall_core::cancel::CancelToken;
use recall_core::config::EngineSettings;
use recall_core::error::{EngineError, Result};
use recall_core::predicate::Predicate;
use recall_core::traits::{ContentStore, EmbeddingClient, LexicalSearch, VectorIndex};
use recall_core::types::QueryResult;

use crate::diversify::{diversify, RankedCandidate};
use crate::fuse::HybridRanker;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub top_k: usize,
    pub filter: Predicate,
    pub vector_weight: f32,
    pub lexical_weight: f32,
    pub diversity_factor: f32,
    /// Candidate multiplier ahead of fusion and diversification.
    pub overfetch_factor: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            filter: Predicate::True,
            vector_weight: 0.7,
            lexical_weight: 0.3,
            diversity_factor: 0.3,
            overfetch_factor: 2,
        }
    }
}

impl SearchOptions {
    pub fn from_settings(settings: &EngineSettings, top_k: usize, filter: Predicate) -> Self {
        Self {
            top_k,
            filter,
            vector_weight: settings.fusion.vector_weight,
            lexical_weight: settings.fusion.lexical_weight,
            diversity_factor: settings.fusion.diversity_factor,
            overfetch_factor: settings.fusion.overfetch_factor,
        }
    }
}

pub struct SearchPipeline<I: VectorIndex> {
    index: Arc<I>,
    embedder: Arc<dyn EmbeddingClient>,
    lexical: Option<Arc<dyn LexicalSearch>>,
    content: Option<Arc<dyn ContentStore>>,
}

impl<I: VectorIndex> SearchPipeline<I> {
    pub fn new(index: Arc<I>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self { index, embedder, lexical: None, content: None }
    }

    pub fn with_lexical(mut self, lexical: Arc<dyn LexicalSearch>) -> Self {
        self.lexical = Some(lexical);
        self
    }

    pub fn with_content_store(mut self, content: Arc<dyn ContentStore>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
        cancel: &CancelToken,
    ) -> Result<Vec<QueryResult>> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidInput("query text must not be empty".to_string()));
        }
        if options.top_k == 0 {
            return Ok(Vec::new());
        }
        cancel.check()?;

        let mut query_vectors = self.embedder.embed_batch(&[query.to_string()])?;
        if query_vectors.is_empty() {
            return Err(EngineError::Unavailable("embedder returned no vector".to_string()));
        }
        let query_vector = query_vectors.remove(0);

        let fetch_k = options.top_k.saturating_mul(options.overfetch_factor.max(1));
        let vector_results = self.index.query(&query_vector, fetch_k, &options.filter)?;
        cancel.check()?;

        let lexical_results = match &self.lexical {
            Some(lexical) => lexical.search(query, fetch_k)?,
            None => Vec::new(),
        };
        cancel.check()?;

        let fused = HybridRanker::fuse(
            &vector_results,
            &lexical_results,
            options.vector_weight,
            options.lexical_weight,
        );

        let candidates = self.attach_vectors(fused)?;
        let mut results: Vec<QueryResult> = diversify(candidates, options.diversity_factor)?
            .into_iter()
            .map(|c| c.result)
            .collect();
        results.truncate(options.top_k);

        self.enrich(&mut results);
        Ok(results)
    }

    /// Pair fused results with their stored vectors. Lexical-only ids may
    /// not exist in the vector index; they keep an empty vector and simply
    /// contribute no redundancy signal downstream.
    fn attach_vectors(&self, fused: Vec<QueryResult>) -> Result<Vec<RankedCandidate>> {
        let mut candidates = Vec::with_capacity(fused.len());
        for result in fused {
            let vector = match self.index.fetch(&result.id)? {
                Some(entry) => entry.vector,
                None => Vec::new(),
            };
            candidates.push(RankedCandidate { result, vector });
        }
        Ok(candidates)
    }

    /// Attach previews after ranking. The content store never influences
    /// ranking and its failures degrade to un-enriched results.
    fn enrich(&self, results: &mut [QueryResult]) {
        let Some(store) = &self.content else {
            return;
        };
        for result in results.iter_mut() {
            match store.preview(&result.id) {
                Ok(Some(preview)) => {
                    result.metadata.insert("preview".to_string(), preview.into());
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(id = %result.id, error = %err, "preview lookup failed");
                }
            }
        }
    }
}
