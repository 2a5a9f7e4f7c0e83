//! Diversity-aware re-ranking, greedy maximal-marginal-relevance style.
//!
//! The output is a permutation of the input: every candidate is placed,
//! none are filtered. O(n²) in the candidate count; callers bound the set
//! they pass in (typically the over-fetched top_k, not the whole index).

use recall_core::error::{EngineError, Result};
use recall_core::types::{QueryResult, Vector};
use recall_core::vector::cosine_similarity;

/// A query result paired with its stored vector, as needed for redundancy
/// scoring. Candidates without a usable vector still participate; they
/// just contribute zero similarity.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub result: QueryResult,
    pub vector: Vector,
}

/// Re-rank `candidates` balancing relevance against redundancy.
///
/// `diversity_factor` 0.0 is a strict no-op returning the input order
/// unchanged; 1.0 ranks purely by dissimilarity to what was already
/// selected. Each step picks the remaining candidate maximizing
/// `score * (1 - f) + (1 - avg_similarity_to_selected) * f`, ties broken
/// by ascending id.
pub fn diversify(candidates: Vec<RankedCandidate>, diversity_factor: f32) -> Result<Vec<RankedCandidate>> {
    if !(0.0..=1.0).contains(&diversity_factor) {
        return Err(EngineError::InvalidInput(format!(
            "diversity_factor {} outside [0, 1]",
            diversity_factor
        )));
    }
    if diversity_factor == 0.0 || candidates.len() < 2 {
        return Ok(candidates);
    }

    let n = candidates.len();
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut ordered: Vec<usize> = Vec::with_capacity(n);

    // The most relevant candidate always leads.
    let first = pick_best(&remaining, |idx| candidates[idx].result.score, &candidates);
    ordered.push(remaining.remove(first));

    while !remaining.is_empty() {
        let adjusted = |idx: usize| {
            let relevance = candidates[idx].result.score;
            let redundancy = avg_similarity(&candidates[idx], &ordered, &candidates);
            relevance * (1.0 - diversity_factor) + (1.0 - redundancy) * diversity_factor
        };
        let best = pick_best(&remaining, adjusted, &candidates);
        ordered.push(remaining.remove(best));
    }

    Ok(ordered.into_iter().map(|idx| candidates[idx].clone()).collect())
}

/// Position in `remaining` of the candidate maximizing `score_of`, ties
/// broken by ascending id for determinism.
fn pick_best(
    remaining: &[usize],
    score_of: impl Fn(usize) -> f32,
    candidates: &[RankedCandidate],
) -> usize {
    let mut best_pos = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (pos, &idx) in remaining.iter().enumerate() {
        let score = score_of(idx);
        let better = score > best_score
            || (score == best_score
                && candidates[idx].result.id < candidates[remaining[best_pos]].result.id);
        if better {
            best_pos = pos;
            best_score = score;
        }
    }
    best_pos
}

/// Mean cosine similarity of `candidate` to everything already selected.
/// Degenerate vector pairs contribute 0 (nothing to be redundant with).
fn avg_similarity(
    candidate: &RankedCandidate,
    selected: &[usize],
    candidates: &[RankedCandidate],
) -> f32 {
    if selected.is_empty() {
        return 0.0;
    }
    let mut total = 0.0_f32;
    for &idx in selected {
        match cosine_similarity(&candidate.vector, &candidates[idx].vector) {
            Some(sim) => total += sim,
            None => {
                tracing::warn!(id = %candidate.result.id, "candidate without usable vector, similarity 0");
            }
        }
    }
    total / selected.len() as f32
}
