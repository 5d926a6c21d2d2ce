use serde::{Deserialize, Serialize};

use super::domain::DomainProfile;

/// Numeric requirements for one progression tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRequirement {
    pub min_completed_tasks: u32,
    pub min_quality_score: f64,
    pub min_reliability_score: f64,
}

impl TierRequirement {
    fn met_by(&self, profile: &DomainProfile) -> bool {
        profile.completed_tasks >= self.min_completed_tasks
            && profile.quality_score >= self.min_quality_score
            && profile.reliability_score >= self.min_reliability_score
    }
}

/// Progression thresholds, evaluated highest tier first. Level 2 only gates
/// on completed volume; quality and reliability start counting from level 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPolicy {
    pub pro: TierRequirement,
    pub trusted: TierRequirement,
    pub contributor_min_completed_tasks: u32,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        Self {
            pro: TierRequirement {
                min_completed_tasks: 30,
                min_quality_score: 4.5,
                min_reliability_score: 90.0,
            },
            trusted: TierRequirement {
                min_completed_tasks: 15,
                min_quality_score: 4.0,
                min_reliability_score: 85.0,
            },
            contributor_min_completed_tasks: 5,
        }
    }
}

impl LevelPolicy {
    /// Pure recompute from the profile's current stats; safe to call
    /// idempotently with the same inputs. First matching tier wins.
    pub fn level_for(&self, profile: &DomainProfile) -> u8 {
        if self.pro.met_by(profile) {
            return 4;
        }
        if self.trusted.met_by(profile) {
            return 3;
        }
        if profile.completed_tasks >= self.contributor_min_completed_tasks {
            return 2;
        }
        1
    }
}

/// Display label for a progression level.
pub const fn level_label(level: u8) -> &'static str {
    match level {
        4 => "Pro",
        3 => "Trusted",
        2 => "Contributor",
        _ => "Explorer",
    }
}
