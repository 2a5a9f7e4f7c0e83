//! User preference aggregation with exponential time decay.
//!
//! A pure function of the supplied interaction window: each interaction's
//! weight decays by `exp(-ln 2 * age / half_life)` and the profile vector
//! is the weighted average of the item vectors, normalized by total weight.
//! Callers decide how much history to retain and pass in; recomputing over
//! the same window always yields the same profile.

use chrono::{DateTime, Duration, Utc};

use recall_core::error::{EngineError, Result};
use recall_core::types::{InteractionRecord, UserProfile, Vector};

pub struct ProfileAggregator {
    half_life: Duration,
}

impl ProfileAggregator {
    pub fn new(half_life: Duration) -> Result<Self> {
        if half_life <= Duration::zero() {
            return Err(EngineError::InvalidInput("half_life must be positive".to_string()));
        }
        Ok(Self { half_life })
    }

    /// Decay multiplier for an interaction of the given age. Future
    /// timestamps clamp to age 0 instead of inflating the weight.
    fn decay(&self, now: DateTime<Utc>, at: DateTime<Utc>) -> f32 {
        let age_secs = (now - at).num_milliseconds().max(0) as f64 / 1000.0;
        let half_life_secs = self.half_life.num_milliseconds() as f64 / 1000.0;
        (-(std::f64::consts::LN_2) * age_secs / half_life_secs).exp() as f32
    }

    /// Build the profile from the full supplied history. `Ok(None)` is the
    /// explicit "no profile" state (empty history, all items unknown, or
    /// zero total weight); callers fall back to their cold-start strategy.
    pub fn update_profile<F>(
        &self,
        user_id: &str,
        history: &[InteractionRecord],
        item_vector: F,
        now: DateTime<Utc>,
    ) -> Result<Option<UserProfile>>
    where
        F: Fn(&str) -> Option<Vector>,
    {
        let mut sum: Option<Vector> = None;
        let mut total_weight = 0.0_f32;
        let mut contributing = 0_usize;

        for record in history {
            if !record.weight.is_finite() || record.weight <= 0.0 {
                tracing::warn!(item_id = %record.item_id, weight = record.weight, "skipping interaction with unusable weight");
                continue;
            }
            let Some(vector) = item_vector(&record.item_id) else {
                tracing::debug!(item_id = %record.item_id, "no vector for interacted item");
                continue;
            };

            let weight = record.weight * self.decay(now, record.timestamp);
            let acc = sum.get_or_insert_with(|| vec![0.0; vector.len()]);
            if acc.len() != vector.len() {
                return Err(EngineError::DimensionMismatch {
                    expected: acc.len(),
                    got: vector.len(),
                });
            }
            for (a, v) in acc.iter_mut().zip(&vector) {
                *a += weight * v;
            }
            total_weight += weight;
            contributing += 1;
        }

        let Some(mut vector) = sum else {
            return Ok(None);
        };
        if total_weight <= f32::EPSILON {
            return Ok(None);
        }
        for v in vector.iter_mut() {
            *v /= total_weight;
        }

        Ok(Some(UserProfile {
            user_id: user_id.to_string(),
            vector,
            last_updated: now,
            interaction_count: contributing,
        }))
    }
}
