//! In-memory vector index.
//!
//! Entries live in a `RwLock<HashMap>`; a write lock is held for the whole
//! upsert batch so readers never observe a half-written entry. The
//! similarity metric is cosine and is fixed for the lifetime of the index
//! instance. Scores are raw cosine similarities (not re-normalized), sorted
//! strictly descending with ascending-id tie-breaks.

use std::collections::HashMap;
use std::sync::RwLock;

use recall_core::error::{EngineError, Result};
use recall_core::predicate::Predicate;
use recall_core::traits::VectorIndex;
use recall_core::types::{cmp_score_desc, IndexEntry, Meta, QueryResult, Vector};
use recall_core::vector::cosine_similarity;

#[derive(Debug, Clone)]
struct StoredEntry {
    vector: Vector,
    metadata: Meta,
    tenant_id: String,
}

pub struct MemoryVectorIndex {
    dim: usize,
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryVectorIndex {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(EngineError::InvalidInput("index dimension must be positive".to_string()));
        }
        Ok(Self { dim, entries: RwLock::new(HashMap::new()) })
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dim(&self, got: usize) -> Result<()> {
        if got != self.dim {
            return Err(EngineError::DimensionMismatch { expected: self.dim, got });
        }
        Ok(())
    }
}

// Lock poisoning means a writer panicked mid-mutation; surfaced as a
// retryable Unavailable, matching storage-layer I/O failure semantics.
fn poisoned<T>(_: T) -> EngineError {
    EngineError::Unavailable("index lock poisoned".to_string())
}

impl VectorIndex for MemoryVectorIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        for entry in &entries {
            self.check_dim(entry.vector.len())?;
            if entry.id.is_empty() {
                return Err(EngineError::InvalidInput("entry id must not be empty".to_string()));
            }
        }

        let mut map = self.entries.write().map_err(poisoned)?;
        for entry in entries {
            tracing::debug!(id = %entry.id, tenant = %entry.tenant_id, "upsert entry");
            map.insert(
                entry.id,
                StoredEntry {
                    vector: entry.vector,
                    metadata: entry.metadata,
                    tenant_id: entry.tenant_id,
                },
            );
        }
        Ok(())
    }

    fn query(&self, vector: &[f32], top_k: usize, filter: &Predicate) -> Result<Vec<QueryResult>> {
        self.check_dim(vector.len())?;
        filter.validate()?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let map = self.entries.read().map_err(poisoned)?;
        let mut results: Vec<QueryResult> = Vec::new();
        for (id, stored) in map.iter() {
            if !filter.matches(&stored.metadata) {
                continue;
            }
            let Some(score) = cosine_similarity(vector, &stored.vector) else {
                tracing::warn!(id = %id, "skipping entry with degenerate vector");
                continue;
            };
            results.push(QueryResult { id: id.clone(), score, metadata: stored.metadata.clone() });
        }

        results.sort_by(|a, b| cmp_score_desc(a.score, b.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(top_k);
        Ok(results)
    }

    fn fetch(&self, id: &str) -> Result<Option<IndexEntry>> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.get(id).map(|stored| IndexEntry {
            id: id.to_string(),
            vector: stored.vector.clone(),
            metadata: stored.metadata.clone(),
            tenant_id: stored.tenant_id.clone(),
        }))
    }

    fn find_ids(&self, filter: &Predicate) -> Result<Vec<String>> {
        filter.validate()?;
        let map = self.entries.read().map_err(poisoned)?;
        let mut ids: Vec<String> = map
            .iter()
            .filter(|(_, stored)| filter.matches(&stored.metadata))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, ids: &[String]) -> Result<usize> {
        let mut map = self.entries.write().map_err(poisoned)?;
        let mut removed = 0;
        for id in ids {
            if map.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
