use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use recall_core::cancel::CancelToken;
use recall_core::config::{resolve_with_base, EngineSettings};
use recall_core::error::EngineError;
use recall_core::predicate::Predicate;
use recall_core::types::{sort_results, Meta, MetaValue, QueryResult};
use recall_core::vector::{cosine_similarity, l2_normalize, neutral_vector};

fn meta(pairs: &[(&str, MetaValue)]) -> Meta {
    let mut m = HashMap::new();
    for (k, v) in pairs {
        m.insert(k.to_string(), v.clone());
    }
    m
}

#[test]
fn predicate_eq_and_in_match_scalar_fields() {
    let m = meta(&[
        ("category", MetaValue::from("news")),
        ("rank", MetaValue::from(3i64)),
        ("live", MetaValue::from(true)),
    ]);

    assert!(Predicate::eq("category", "news").matches(&m));
    assert!(!Predicate::eq("category", "sports").matches(&m));
    assert!(Predicate::eq("live", true).matches(&m));
    assert!(Predicate::is_in("rank", vec![MetaValue::from(2i64), MetaValue::from(3i64)]).matches(&m));
    assert!(!Predicate::is_in("rank", vec![MetaValue::from(9i64)]).matches(&m));
    // missing field never matches
    assert!(!Predicate::eq("absent", "x").matches(&m));
}

#[test]
fn predicate_and_flattens_and_drops_true() {
    let p = Predicate::True
        .and(Predicate::eq("a", 1i64))
        .and(Predicate::eq("b", 2i64))
        .and(Predicate::True);

    match &p {
        Predicate::All(parts) => assert_eq!(parts.len(), 2),
        other => panic!("expected flattened All, got {:?}", other),
    }

    let m = meta(&[("a", MetaValue::from(1i64)), ("b", MetaValue::from(2i64))]);
    assert!(p.matches(&m));
}

#[test]
fn predicate_any_matches_either_branch() {
    let p = Predicate::Any(vec![Predicate::eq("a", 1i64), Predicate::eq("a", 2i64)]);
    assert!(p.matches(&meta(&[("a", MetaValue::from(2i64))])));
    assert!(!p.matches(&meta(&[("a", MetaValue::from(3i64))])));
}

#[test]
fn malformed_predicates_are_invalid_input() {
    let empty_field = Predicate::eq("", "x");
    let empty_in = Predicate::In("f".to_string(), vec![]);
    let empty_any = Predicate::Any(vec![]);

    for p in [empty_field, empty_in, empty_any] {
        let err = p.validate().expect_err("should be rejected");
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(!err.is_retryable());
    }
    Predicate::All(vec![]).validate().expect("empty All matches everything and is fine");
}

#[test]
fn sort_results_orders_desc_with_ascending_id_ties() {
    let mut results = vec![
        QueryResult { id: "b".into(), score: 0.5, metadata: Meta::new() },
        QueryResult { id: "a".into(), score: 0.5, metadata: Meta::new() },
        QueryResult { id: "c".into(), score: 0.9, metadata: Meta::new() },
        QueryResult { id: "d".into(), score: f32::NAN, metadata: Meta::new() },
    ];
    sort_results(&mut results);

    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b", "d"], "NaN sinks to the end");
}

#[test]
fn cosine_similarity_guards_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
    assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_none());
    assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
    assert!(cosine_similarity(&[], &[]).is_none());
}

#[test]
fn neutral_vector_is_unit_length() {
    let mut v = neutral_vector(4);
    assert_eq!(v.len(), 4);
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);

    l2_normalize(&mut v);
    let norm2: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm2 - 1.0).abs() < 1e-5);
}

#[test]
fn cancel_token_fires_on_cancel_and_timeout() {
    let token = CancelToken::new();
    assert!(token.check().is_ok());
    token.cancel();
    assert!(token.is_cancelled());
    assert!(matches!(token.check(), Err(EngineError::Cancelled)));

    let timed = CancelToken::with_timeout(Duration::from_millis(0));
    assert!(timed.is_cancelled());
}

#[test]
fn settings_defaults_are_valid_and_bad_overlap_is_rejected() {
    let settings = EngineSettings::default();
    settings.validate().expect("defaults must validate");
    assert_eq!(settings.recommend.overfetch_factor, 3);

    let mut bad = EngineSettings::default();
    bad.chunking.overlap = bad.chunking.max_len;
    assert!(bad.validate().is_err());

    let mut bad = EngineSettings::default();
    bad.fusion.overfetch_factor = 0;
    assert!(bad.validate().is_err());
}

#[test]
fn resolve_with_base_joins_relative_and_keeps_absolute() {
    let tmp = TempDir::new().expect("tempdir");

    let relative = resolve_with_base(tmp.path(), "docs/corpus");
    assert_eq!(relative, tmp.path().join("docs/corpus"));

    let absolute = tmp.path().join("elsewhere.txt");
    let resolved = resolve_with_base(Path::new("/ignored"), absolute.to_string_lossy());
    assert_eq!(resolved, absolute);
}

#[test]
fn meta_value_serde_is_untagged() {
    let m = meta(&[("s", MetaValue::from("x")), ("n", MetaValue::from(2.5)), ("b", MetaValue::from(true))]);
    let json = serde_json::to_string(&m).expect("serialize");
    assert!(json.contains("\"x\""));
    let back: Meta = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, m);
}
