//! Small vector-math helpers shared by the index, diversifier and profile
//! aggregation. All pure CPU work, no I/O.

use crate::types::Vector;

/// Cosine similarity clamped to [-1, 1]. Returns `None` for mismatched
/// lengths, empty inputs or a zero-norm side so callers decide how to
/// handle degenerate vectors instead of getting a silent 0.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
    if lhs.is_empty() || lhs.len() != rhs.len() {
        return None;
    }

    let mut dot = 0.0_f32;
    let mut lhs_norm = 0.0_f32;
    let mut rhs_norm = 0.0_f32;
    for (l, r) in lhs.iter().zip(rhs.iter()) {
        dot += l * r;
        lhs_norm += l * l;
        rhs_norm += r * r;
    }
    if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
        return None;
    }

    Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// In-place L2 normalization. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Unit vector with equal mass in every dimension, used as the cold-start
/// query seed when no profile exists.
pub fn neutral_vector(dim: usize) -> Vector {
    if dim == 0 {
        return Vec::new();
    }
    let value = 1.0 / (dim as f32).sqrt();
    vec![value; dim]
}
