//! Content-hash keyed embedding cache.
//!
//! Optional decorator around any `EmbeddingClient`: the cache is consulted
//! before the provider and written through on misses, so re-indexing
//! unchanged chunks never re-embeds them. Not part of the index contract,
//! purely a convenience layer.

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::{Arc, RwLock};

use recall_core::error::{EngineError, Result};
use recall_core::traits::EmbeddingClient;
use recall_core::types::Vector;
use twox_hash::XxHash64;

pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingClient>,
    cache: RwLock<HashMap<u64, Vector>>,
}

fn content_key(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingClient>) -> Self {
        Self { inner, cache: RwLock::new(HashMap::new()) }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|map| map.len()).unwrap_or(0)
    }
}

impl EmbeddingClient for CachedEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let keys: Vec<u64> = texts.iter().map(|t| content_key(t)).collect();

        let mut out: Vec<Option<Vector>> = vec![None; texts.len()];
        let mut miss_texts: Vec<String> = Vec::new();
        let mut miss_positions: Vec<usize> = Vec::new();
        {
            let cache = self
                .cache
                .read()
                .map_err(|_| EngineError::Unavailable("embedding cache lock poisoned".to_string()))?;
            for (i, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(vector) => out[i] = Some(vector.clone()),
                    None => {
                        miss_texts.push(texts[i].clone());
                        miss_positions.push(i);
                    }
                }
            }
        }

        if !miss_texts.is_empty() {
            tracing::debug!(misses = miss_texts.len(), total = texts.len(), "embedding cache misses");
            let vectors = self.inner.embed_batch(&miss_texts)?;
            if vectors.len() != miss_texts.len() {
                return Err(EngineError::Unavailable(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    miss_texts.len()
                )));
            }
            let mut cache = self
                .cache
                .write()
                .map_err(|_| EngineError::Unavailable("embedding cache lock poisoned".to_string()))?;
            for (pos, vector) in miss_positions.into_iter().zip(vectors) {
                cache.insert(keys[pos], vector.clone());
                out[pos] = Some(vector);
            }
        }

        // Every slot is filled: hits up front, misses just above.
        Ok(out.into_iter().flatten().collect())
    }
}
