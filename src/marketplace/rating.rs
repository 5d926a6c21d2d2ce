use super::domain::{round2, DomainProfile};
use super::leveling::LevelPolicy;

/// Applies a completed-task outcome to a domain profile.
///
/// Input is trusted: the rating value must already be validated to [1, 5] by
/// the caller. The whole update mutates the profile in place so the owning
/// store can persist it as a single atomic write.
pub struct RatingEngine {
    policy: LevelPolicy,
}

impl RatingEngine {
    pub fn new(policy: LevelPolicy) -> Self {
        Self { policy }
    }

    pub fn apply(&self, profile: &mut DomainProfile, rating: u8, on_time: bool) {
        profile.completed_tasks += 1;
        profile.rating_sum += f64::from(rating);
        profile.quality_score = round2(profile.rating_sum / f64::from(profile.completed_tasks));

        if on_time {
            profile.on_time_completions += 1;
        }

        // Legacy profiles may predate the assignment counter; fall back to
        // completed volume so reliability stays defined.
        let assigned = if profile.total_assigned > 0 {
            profile.total_assigned
        } else {
            profile.completed_tasks
        };
        let reliability =
            round2(f64::from(profile.on_time_completions) / f64::from(assigned) * 100.0);
        // The assignment counter is updated by a separate selection event and
        // can lag behind completions, so keep the published bound.
        profile.reliability_score = reliability.min(100.0);

        profile.level = self.policy.level_for(profile);
    }
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(LevelPolicy::default())
    }
}
