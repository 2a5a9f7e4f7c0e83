use crate::error::Result;
use crate::predicate::Predicate;
use crate::types::{IndexEntry, InteractionRecord, QueryResult, Vector};

/// The shared mutable resource of the engine. Implementations must be safe
/// for concurrent callers; `upsert` is last-writer-wins per id and readers
/// never observe a half-written entry.
pub trait VectorIndex: Send + Sync {
    /// Fixed dimensionality of every vector in this index instance.
    fn dim(&self) -> usize;

    /// Insert or fully replace entries by id. Idempotent.
    fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Nearest-neighbor search over entries matching `filter`, ranked by
    /// the index's similarity metric. `top_k == 0` returns an empty list.
    fn query(&self, vector: &[f32], top_k: usize, filter: &Predicate) -> Result<Vec<QueryResult>>;

    /// Point lookup by id.
    fn fetch(&self, id: &str) -> Result<Option<IndexEntry>>;

    /// Resolve the ids of all entries matching `filter`, ascending.
    fn find_ids(&self, filter: &Predicate) -> Result<Vec<String>>;

    /// Remove entries by id, returning how many actually existed.
    fn delete(&self, ids: &[String]) -> Result<usize>;
}

/// External text-to-vector service. Failures surface as `Unavailable`
/// (retryable) and never as index errors.
pub trait EmbeddingClient: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

/// Optional external full-text engine; its results only feed score fusion.
pub trait LexicalSearch: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<QueryResult>>;
}

/// Passive preview lookup used to enrich results after ranking. Never
/// participates in ranking itself.
pub trait ContentStore: Send + Sync {
    fn preview(&self, id: &str) -> Result<Option<String>>;
}

/// Append-only engagement history, consumed by profile aggregation.
pub trait InteractionLog: Send + Sync {
    fn history(&self, user_id: &str) -> Result<Vec<InteractionRecord>>;
}
