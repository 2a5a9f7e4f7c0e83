use std::collections::HashMap;

use recall_core::error::EngineError;
use recall_core::predicate::Predicate;
use recall_core::traits::VectorIndex;
use recall_core::types::{IndexEntry, Meta, MetaValue};
use recall_index::MemoryVectorIndex;

fn entry(id: &str, vector: Vec<f32>, pairs: &[(&str, MetaValue)]) -> IndexEntry {
    let mut metadata: Meta = HashMap::new();
    for (k, v) in pairs {
        metadata.insert(k.to_string(), v.clone());
    }
    IndexEntry { id: id.to_string(), vector, metadata, tenant_id: String::new() }
}

#[test]
fn cosine_ranking_scenario() {
    let index = MemoryVectorIndex::new(2).expect("index");
    index
        .upsert(vec![
            entry("chunk-a", vec![1.0, 0.0], &[("document_id", "doc-1".into())]),
            entry("chunk-b", vec![0.0, 1.0], &[("document_id", "doc-1".into())]),
            entry("chunk-c", vec![0.7, 0.7], &[("document_id", "doc-1".into())]),
        ])
        .expect("upsert");

    let results = index.query(&[1.0, 0.0], 2, &Predicate::True).expect("query");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "chunk-a");
    assert_eq!(results[1].id, "chunk-c");
    assert!(results[0].score > results[1].score);
}

#[test]
fn results_sorted_desc_with_ascending_id_ties() {
    let index = MemoryVectorIndex::new(2).expect("index");
    // identical vectors produce identical scores, so ties resolve by id
    index
        .upsert(vec![
            entry("b", vec![1.0, 0.0], &[]),
            entry("a", vec![1.0, 0.0], &[]),
            entry("c", vec![0.5, 0.5], &[]),
        ])
        .expect("upsert");

    let results = index.query(&[1.0, 0.0], 10, &Predicate::True).expect("query");
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn upsert_is_last_writer_wins() {
    let index = MemoryVectorIndex::new(2).expect("index");
    index.upsert(vec![entry("x", vec![1.0, 0.0], &[])]).expect("first");
    index.upsert(vec![entry("x", vec![0.0, 1.0], &[])]).expect("second");

    assert_eq!(index.len(), 1, "re-upserting the same id must not duplicate");
    let fetched = index.fetch("x").expect("fetch").expect("present");
    assert_eq!(fetched.vector, vec![0.0, 1.0]);
}

#[test]
fn dimension_mismatch_is_rejected_and_not_retryable() {
    let index = MemoryVectorIndex::new(3).expect("index");

    let err = index.upsert(vec![entry("x", vec![1.0, 0.0], &[])]).expect_err("bad upsert");
    assert!(matches!(err, EngineError::DimensionMismatch { expected: 3, got: 2 }));
    assert!(!err.is_retryable());

    let err = index.query(&[1.0, 0.0], 5, &Predicate::True).expect_err("bad query");
    assert!(matches!(err, EngineError::DimensionMismatch { .. }));
}

#[test]
fn top_k_zero_returns_empty_not_error() {
    let index = MemoryVectorIndex::new(2).expect("index");
    index.upsert(vec![entry("x", vec![1.0, 0.0], &[])]).expect("upsert");
    let results = index.query(&[1.0, 0.0], 0, &Predicate::True).expect("query");
    assert!(results.is_empty());
}

#[test]
fn delete_returns_count_and_tolerates_missing_ids() {
    let index = MemoryVectorIndex::new(2).expect("index");
    index
        .upsert(vec![entry("a", vec![1.0, 0.0], &[]), entry("b", vec![0.0, 1.0], &[])])
        .expect("upsert");

    let removed = index
        .delete(&["a".to_string(), "ghost".to_string()])
        .expect("delete");
    assert_eq!(removed, 1);
    assert_eq!(index.len(), 1);
}

#[test]
fn metadata_filters_restrict_query_and_find_ids() {
    let index = MemoryVectorIndex::new(2).expect("index");
    index
        .upsert(vec![
            entry("n1", vec![1.0, 0.0], &[("category", "news".into())]),
            entry("n2", vec![0.9, 0.1], &[("category", "news".into())]),
            entry("s1", vec![1.0, 0.0], &[("category", "sports".into())]),
        ])
        .expect("upsert");

    let news = index
        .query(&[1.0, 0.0], 10, &Predicate::eq("category", "news"))
        .expect("query");
    assert_eq!(news.len(), 2);
    assert!(news.iter().all(|r| r.id.starts_with('n')));

    let either = index
        .find_ids(&Predicate::is_in(
            "category",
            vec!["news".into(), "sports".into()],
        ))
        .expect("find_ids");
    assert_eq!(either, vec!["n1", "n2", "s1"], "find_ids is sorted ascending");
}

#[test]
fn malformed_predicate_is_invalid_input() {
    let index = MemoryVectorIndex::new(2).expect("index");
    let err = index
        .query(&[1.0, 0.0], 5, &Predicate::Any(vec![]))
        .expect_err("malformed filter");
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn degenerate_stored_vectors_are_skipped_not_fatal() {
    let index = MemoryVectorIndex::new(2).expect("index");
    index
        .upsert(vec![entry("zero", vec![0.0, 0.0], &[]), entry("ok", vec![1.0, 0.0], &[])])
        .expect("upsert");

    let results = index.query(&[1.0, 0.0], 10, &Predicate::True).expect("query");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "ok");
}
