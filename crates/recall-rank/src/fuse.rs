//! Score fusion across the vector and lexical retrieval signals.
//!
//! Normalization is per-call min-max into [0, 1] over each source list,
//! which keeps combined scores comparable across the candidate set of one
//! call. Min-max is monotonic, so fusing a single source ranks identically
//! to that source alone. When every score in a source is equal, all of its
//! candidates normalize to 1.0 (they are indistinguishable by that signal).

use std::collections::HashMap;

use recall_core::types::{sort_results, QueryResult};

pub struct HybridRanker;

impl HybridRanker {
    /// Fuse two ranked lists into one, weighting each source.
    ///
    /// An id missing from one source contributes 0 for that term, it is
    /// not penalized further. Weights are taken as-is; callers may use
    /// unnormalized weights for emphasis.
    pub fn fuse(
        vector_results: &[QueryResult],
        lexical_results: &[QueryResult],
        vector_weight: f32,
        lexical_weight: f32,
    ) -> Vec<QueryResult> {
        let vector_norm = normalize(vector_results);
        let lexical_norm = normalize(lexical_results);

        // Vector metadata wins when an id shows up in both sources.
        let mut combined: HashMap<String, QueryResult> = HashMap::new();
        for result in vector_results.iter().chain(lexical_results) {
            combined.entry(result.id.clone()).or_insert_with(|| QueryResult {
                id: result.id.clone(),
                score: 0.0,
                metadata: result.metadata.clone(),
            });
        }
        for result in combined.values_mut() {
            let v = vector_norm.get(&result.id).copied().unwrap_or(0.0);
            let l = lexical_norm.get(&result.id).copied().unwrap_or(0.0);
            result.score = vector_weight * v + lexical_weight * l;
        }

        let mut fused: Vec<QueryResult> = combined.into_values().collect();
        sort_results(&mut fused);
        fused
    }
}

/// Min-max normalize one source list into [0, 1] keyed by id. NaN scores
/// are recovered locally: logged and treated as the source minimum.
fn normalize(results: &[QueryResult]) -> HashMap<String, f32> {
    let finite: Vec<f32> = results.iter().map(|r| r.score).filter(|s| s.is_finite()).collect();
    let min = finite.iter().copied().fold(f32::INFINITY, f32::min);
    let max = finite.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut out = HashMap::with_capacity(results.len());
    for result in results {
        let score = if result.score.is_finite() {
            result.score
        } else {
            tracing::warn!(id = %result.id, score = result.score, "non-finite score, using source minimum");
            min
        };
        let norm = if finite.is_empty() {
            1.0
        } else if (max - min).abs() <= f32::EPSILON {
            1.0
        } else {
            (score - min) / (max - min)
        };
        out.insert(result.id.clone(), norm);
    }
    out
}
