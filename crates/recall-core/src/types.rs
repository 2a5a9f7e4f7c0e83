//! Domain types shared by the index, ranking and recommendation crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub type Vector = Vec<f32>;
pub type Meta = HashMap<String, MetaValue>;

/// A scalar metadata value. Entries carry only flat string/number/bool
/// fields so predicate evaluation stays trivial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self { MetaValue::Str(v.to_string()) }
}
impl From<String> for MetaValue {
    fn from(v: String) -> Self { MetaValue::Str(v) }
}
impl From<f64> for MetaValue {
    fn from(v: f64) -> Self { MetaValue::Num(v) }
}
impl From<i64> for MetaValue {
    fn from(v: i64) -> Self { MetaValue::Num(v as f64) }
}
impl From<usize> for MetaValue {
    fn from(v: usize) -> Self { MetaValue::Num(v as f64) }
}
impl From<bool> for MetaValue {
    fn from(v: bool) -> Self { MetaValue::Bool(v) }
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One row of the vector index.
///
/// Owned by the index once inserted: replaced wholesale on upsert, removed
/// on delete, never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vector,
    pub metadata: Meta,
    pub tenant_id: String,
}

/// A source document. The authoritative copy lives in an external store;
/// the engine only derives chunks from `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Meta,
}

/// A bounded span of a document, the unit of index granularity.
///
/// `id` is `"<document_id>#<chunk_index>"`. Offsets are byte positions into
/// the source content; chunk boundaries are deterministic for a given
/// chunker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub section_hint: Option<String>,
}

impl Chunk {
    pub fn id_for(document_id: &str, chunk_index: usize) -> String {
        format!("{}#{}", document_id, chunk_index)
    }
}

/// The minimal surface returned by every retrieval stage.
///
/// `score` is stage-specific but higher is always better. Result lists are
/// sorted by strictly decreasing score, ties broken by ascending id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub score: f32,
    pub metadata: Meta,
}

/// Descending score comparator that pushes NaN to the end instead of
/// poisoning the sort.
pub fn cmp_score_desc(a: f32, b: f32) -> Ordering {
    match b.partial_cmp(&a) {
        Some(ord) => ord,
        None => match (a.is_nan(), b.is_nan()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Ordering::Equal,
        },
    }
}

/// Canonical result ordering: score descending, ties by ascending id.
pub fn sort_results(results: &mut [QueryResult]) {
    results.sort_by(|a, b| cmp_score_desc(a.score, b.score).then_with(|| a.id.cmp(&b.id)));
}

/// A user's aggregated taste vector. Created lazily on first interaction,
/// removed only on explicit user-data erasure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub vector: Vector,
    pub last_updated: DateTime<Utc>,
    pub interaction_count: usize,
}

/// One engagement event. Immutable once recorded; the interaction log is
/// append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: String,
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    pub weight: f32,
}

/// A document-level mutation fed to the incremental indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocOperation {
    Insert(Document),
    Update(Document),
    Delete { document_id: String },
}

impl DocOperation {
    pub fn document_id(&self) -> &str {
        match self {
            DocOperation::Insert(doc) | DocOperation::Update(doc) => &doc.id,
            DocOperation::Delete { document_id } => document_id,
        }
    }
}

/// Per-document failure inside a batch. Reported individually so callers
/// can retry exactly what failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedOperation {
    pub document_id: String,
    pub error: String,
}

/// Outcome of an indexer batch. Partial failure is structured data, not an
/// error: counts plus the per-document failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: Vec<FailedOperation>,
    pub cancelled: bool,
}

impl IndexerReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}
