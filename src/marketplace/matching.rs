use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{round2, AvailabilityStatus, DomainProfile, UserId};

/// Scoring weights and quotas for applicant ranking. Kept as named
/// configuration so the numbers can be tuned and tested independently of the
/// algorithm shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub quality_weight: f64,
    pub reliability_weight: f64,
    pub skill_weight: f64,
    pub availability_weight: f64,
    /// Skill-match base per level, indexed by `level - 1`.
    pub level_skill_scores: [f64; 4],
    /// Added to the skill component while the beginner boost window is open.
    pub beginner_boost_bonus: f64,
    pub skill_score_cap: f64,
    pub available_score: f64,
    pub busy_score: f64,
    pub experienced_quota: usize,
    pub rookie_quota: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            quality_weight: 0.4,
            reliability_weight: 0.3,
            skill_weight: 0.2,
            availability_weight: 0.1,
            level_skill_scores: [40.0, 60.0, 80.0, 100.0],
            beginner_boost_bonus: 15.0,
            skill_score_cap: 100.0,
            available_score: 100.0,
            busy_score: 50.0,
            experienced_quota: 7,
            rookie_quota: 3,
        }
    }
}

/// One applicant joined with their domain profile, ready for scoring.
/// Ephemeral: built per ranking request and discarded with the response.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub freelancer_id: UserId,
    pub name: String,
    pub email: String,
    pub profile: DomainProfile,
    pub availability_status: AvailabilityStatus,
    pub applied_at: DateTime<Utc>,
}

/// Ranked applicant returned to the client view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedApplicant {
    pub freelancer_id: UserId,
    pub name: String,
    pub email: String,
    pub level: u8,
    pub quality_score: f64,
    pub reliability_score: f64,
    pub completed_tasks: u32,
    pub availability_status: AvailabilityStatus,
    pub applied_at: DateTime<Utc>,
    pub final_score: f64,
    pub is_rookie: bool,
    pub is_beginner: bool,
}

/// Composite scorer plus the experienced/rookie pool split.
pub struct MatchingEngine {
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Composite 0-100 score: quality and reliability carry most of the
    /// weight, level stands in for skill match, availability breaks the rest.
    pub fn final_score(
        &self,
        profile: &DomainProfile,
        availability_status: AvailabilityStatus,
        now: DateTime<Utc>,
    ) -> f64 {
        let config = &self.config;

        let quality_norm = profile.quality_score / 5.0 * 100.0;
        let reliability_norm = profile.reliability_score;

        let level_index = profile.level.saturating_sub(1) as usize;
        let mut skill_match = config
            .level_skill_scores
            .get(level_index)
            .copied()
            .unwrap_or(config.level_skill_scores[0]);
        if profile.boost_active(now) {
            skill_match = (skill_match + config.beginner_boost_bonus).min(config.skill_score_cap);
        }

        let availability = match availability_status {
            AvailabilityStatus::Available => config.available_score,
            AvailabilityStatus::Busy => config.busy_score,
        };

        round2(
            config.quality_weight * quality_norm
                + config.reliability_weight * reliability_norm
                + config.skill_weight * skill_match
                + config.availability_weight * availability,
        )
    }

    /// Rank candidates into the bounded top-N selection: the experienced pool
    /// (level >= 2) fills up to `experienced_quota` slots, rookies (level 1)
    /// up to `rookie_quota`, experienced listed first. Quotas are fixed, not
    /// proportional: a shortfall in one pool is never backfilled from the
    /// other, which is what guarantees rookie visibility.
    pub fn rank(&self, candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<RankedApplicant> {
        let mut experienced = Vec::new();
        let mut rookies = Vec::new();

        for candidate in candidates {
            let final_score =
                self.final_score(&candidate.profile, candidate.availability_status, now);
            let is_rookie = candidate.profile.level == 1;
            let ranked = RankedApplicant {
                freelancer_id: candidate.freelancer_id,
                name: candidate.name,
                email: candidate.email,
                level: candidate.profile.level,
                quality_score: candidate.profile.quality_score,
                reliability_score: candidate.profile.reliability_score,
                completed_tasks: candidate.profile.completed_tasks,
                availability_status: candidate.availability_status,
                applied_at: candidate.applied_at,
                final_score,
                is_rookie,
                is_beginner: candidate.profile.is_beginner(),
            };
            if is_rookie {
                rookies.push(ranked);
            } else {
                experienced.push(ranked);
            }
        }

        // Stable sort keeps submission order deterministic on score ties.
        experienced.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        rookies.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

        experienced.truncate(self.config.experienced_quota);
        rookies.truncate(self.config.rookie_quota);

        experienced.extend(rookies);
        experienced
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
