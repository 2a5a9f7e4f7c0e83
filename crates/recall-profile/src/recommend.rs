//! Profile-driven recommendations over the vector index.
//!
//! Two paths converge on one output contract: with a profile, the index is
//! queried with the profile vector; without one (cold start) a neutral
//! unit vector plus the configured trending filter stands in. Interaction
//! exclusion is a post-filter over an over-fetched candidate set, so
//! coming up short of `count` is expected behavior, not an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use recall_core::cancel::CancelToken;
use recall_core::error::Result;
use recall_core::predicate::Predicate;
use recall_core::traits::{InteractionLog, VectorIndex};
use recall_core::types::{QueryResult, Vector};
use recall_core::vector::neutral_vector;
use recall_rank::{diversify, RankedCandidate};

use crate::aggregate::ProfileAggregator;

#[derive(Clone)]
pub struct RecommendConfig {
    /// Over-fetch multiplier compensating for candidates removed by the
    /// interaction-exclusion post-filter.
    pub overfetch_factor: usize,
    pub half_life: chrono::Duration,
    /// Cold-start filter selecting neutral/trending items. `None` falls
    /// back to the unrestricted index.
    pub trending_filter: Option<Predicate>,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 3,
            half_life: chrono::Duration::days(30),
            trending_filter: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendRequest {
    pub user_id: String,
    pub count: usize,
    pub diversity_factor: f32,
    pub exclude_interacted: bool,
    pub category_filter: Option<Predicate>,
}

pub struct RecommendationEngine<I: VectorIndex> {
    index: Arc<I>,
    interactions: Arc<dyn InteractionLog>,
    aggregator: ProfileAggregator,
    config: RecommendConfig,
}

impl<I: VectorIndex> RecommendationEngine<I> {
    pub fn new(
        index: Arc<I>,
        interactions: Arc<dyn InteractionLog>,
        config: RecommendConfig,
    ) -> Result<Self> {
        let aggregator = ProfileAggregator::new(config.half_life)?;
        Ok(Self { index, interactions, aggregator, config })
    }

    pub fn recommend(
        &self,
        request: &RecommendRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<QueryResult>> {
        if request.count == 0 {
            return Ok(Vec::new());
        }
        cancel.check()?;

        let history = self.interactions.history(&request.user_id)?;
        let item_vectors = self.load_item_vectors(&history)?;
        let profile = self.aggregator.update_profile(
            &request.user_id,
            &history,
            |id| item_vectors.get(id).cloned(),
            Utc::now(),
        )?;
        cancel.check()?;

        let (query_vector, base_filter) = match profile {
            Some(profile) => {
                tracing::debug!(user_id = %request.user_id, interactions = profile.interaction_count, "personalized path");
                (profile.vector, Predicate::True)
            }
            None => {
                tracing::debug!(user_id = %request.user_id, "cold-start path");
                let filter = self.config.trending_filter.clone().unwrap_or(Predicate::True);
                (neutral_vector(self.index.dim()), filter)
            }
        };
        let filter = match &request.category_filter {
            Some(category) => base_filter.and(category.clone()),
            None => base_filter,
        };

        let fetch_k = request.count.saturating_mul(self.config.overfetch_factor.max(1));
        let mut results = self.index.query(&query_vector, fetch_k, &filter)?;
        cancel.check()?;

        if request.exclude_interacted {
            let interacted: HashSet<&str> = history.iter().map(|r| r.item_id.as_str()).collect();
            results.retain(|r| !is_interacted(r, &interacted));
        }

        let candidates = self.attach_vectors(results)?;
        let mut out: Vec<QueryResult> = diversify(candidates, request.diversity_factor)?
            .into_iter()
            .map(|c| c.result)
            .collect();
        out.truncate(request.count);
        Ok(out)
    }

    /// Resolve the vectors of interacted items up front so profile
    /// aggregation stays a pure function over its inputs.
    fn load_item_vectors(
        &self,
        history: &[recall_core::types::InteractionRecord],
    ) -> Result<HashMap<String, Vector>> {
        let mut vectors = HashMap::new();
        for record in history {
            if vectors.contains_key(&record.item_id) {
                continue;
            }
            if let Some(entry) = self.index.fetch(&record.item_id)? {
                vectors.insert(record.item_id.clone(), entry.vector);
            }
        }
        Ok(vectors)
    }

    fn attach_vectors(&self, results: Vec<QueryResult>) -> Result<Vec<RankedCandidate>> {
        let mut candidates = Vec::with_capacity(results.len());
        for result in results {
            let vector = match self.index.fetch(&result.id)? {
                Some(entry) => entry.vector,
                None => Vec::new(),
            };
            candidates.push(RankedCandidate { result, vector });
        }
        Ok(candidates)
    }
}

/// An item counts as interacted when its id, or the document/item it was
/// derived from, shows up in the user's history.
fn is_interacted(result: &QueryResult, interacted: &HashSet<&str>) -> bool {
    if interacted.contains(result.id.as_str()) {
        return true;
    }
    for field in ["document_id", "item_id"] {
        if let Some(value) = result.metadata.get(field).and_then(|v| v.as_str()) {
            if interacted.contains(value) {
                return true;
            }
        }
    }
    false
}
