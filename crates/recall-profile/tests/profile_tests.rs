use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use recall_core::error::EngineError;
use recall_core::types::{InteractionRecord, Vector};
use recall_profile::ProfileAggregator;

fn record(item_id: &str, weight: f32, age: Duration, now: chrono::DateTime<chrono::Utc>) -> InteractionRecord {
    InteractionRecord {
        user_id: "u1".to_string(),
        item_id: item_id.to_string(),
        timestamp: now - age,
        weight,
    }
}

fn lookup(pairs: &[(&str, Vec<f32>)]) -> HashMap<String, Vector> {
    pairs.iter().map(|(id, v)| (id.to_string(), v.clone())).collect()
}

fn now() -> chrono::DateTime<chrono::Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).single().expect("timestamp")
}

#[test]
fn equal_fresh_interactions_average_item_vectors() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let now = now();
    let history = vec![
        record("a", 1.0, Duration::zero(), now),
        record("b", 1.0, Duration::zero(), now),
    ];
    let vectors = lookup(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);

    let profile = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect("aggregate")
        .expect("profile exists");

    assert!((profile.vector[0] - 0.5).abs() < 1e-5);
    assert!((profile.vector[1] - 0.5).abs() < 1e-5);
    assert_eq!(profile.interaction_count, 2);
    assert_eq!(profile.user_id, "u1");
}

#[test]
fn one_half_life_halves_the_influence() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let now = now();
    let history = vec![
        record("fresh", 1.0, Duration::zero(), now),
        record("stale", 1.0, Duration::days(7), now),
    ];
    let vectors = lookup(&[("fresh", vec![1.0, 0.0]), ("stale", vec![0.0, 1.0])]);

    let profile = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect("aggregate")
        .expect("profile exists");

    // (1.0 * [1,0] + 0.5 * [0,1]) / 1.5
    assert!((profile.vector[0] - 2.0 / 3.0).abs() < 1e-3);
    assert!((profile.vector[1] - 1.0 / 3.0).abs() < 1e-3);
}

#[test]
fn empty_history_yields_no_profile() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let profile = aggregator
        .update_profile("u1", &[], |_| None, now())
        .expect("aggregate");
    assert!(profile.is_none(), "no history is the explicit no-profile state");
}

#[test]
fn unknown_items_are_skipped_and_may_leave_no_profile() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let now = now();
    let history = vec![record("ghost", 1.0, Duration::zero(), now)];

    let profile = aggregator
        .update_profile("u1", &history, |_| None, now)
        .expect("aggregate");
    assert!(profile.is_none());
}

#[test]
fn unusable_weights_are_skipped() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let now = now();
    let history = vec![
        record("a", 0.0, Duration::zero(), now),
        record("a", -2.0, Duration::zero(), now),
        record("a", f32::NAN, Duration::zero(), now),
        record("b", 1.0, Duration::zero(), now),
    ];
    let vectors = lookup(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);

    let profile = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect("aggregate")
        .expect("profile exists");

    assert_eq!(profile.interaction_count, 1, "only the valid interaction contributes");
    assert!((profile.vector[1] - 1.0).abs() < 1e-5);
}

#[test]
fn recomputation_over_the_same_window_is_identical() {
    let aggregator = ProfileAggregator::new(Duration::days(3)).expect("aggregator");
    let now = now();
    let history = vec![
        record("a", 2.0, Duration::days(1), now),
        record("b", 1.0, Duration::hours(5), now),
        record("a", 0.5, Duration::days(2), now),
    ];
    let vectors = lookup(&[("a", vec![0.8, 0.2]), ("b", vec![0.1, 0.9])]);

    let first = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect("aggregate")
        .expect("profile");
    let second = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect("aggregate")
        .expect("profile");

    assert_eq!(first.vector, second.vector, "aggregation is a pure function of the window");
}

#[test]
fn future_timestamps_clamp_to_age_zero() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let now = now();
    let history = vec![record("a", 1.0, Duration::days(-2), now)];
    let vectors = lookup(&[("a", vec![1.0, 0.0])]);

    let profile = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect("aggregate")
        .expect("profile");
    assert!((profile.vector[0] - 1.0).abs() < 1e-5, "no amplification from clock skew");
}

#[test]
fn mismatched_item_vector_dimensions_are_an_error() {
    let aggregator = ProfileAggregator::new(Duration::days(7)).expect("aggregator");
    let now = now();
    let history = vec![
        record("a", 1.0, Duration::zero(), now),
        record("b", 1.0, Duration::zero(), now),
    ];
    let vectors = lookup(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0, 0.0])]);

    let err = aggregator
        .update_profile("u1", &history, |id| vectors.get(id).cloned(), now)
        .expect_err("mixed dimensionality");
    assert!(matches!(err, EngineError::DimensionMismatch { .. }));
}

#[test]
fn non_positive_half_life_is_rejected() {
    assert!(ProfileAggregator::new(Duration::zero()).is_err());
    assert!(ProfileAggregator::new(Duration::days(-1)).is_err());
}
