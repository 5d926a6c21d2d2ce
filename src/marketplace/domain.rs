use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for marketplace accounts (clients and freelancers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for posted tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

/// Skill-domain name normalized at the boundary: stored trimmed, compared and
/// hashed case-insensitively so "web development" and "Web Development" always
/// resolve to the same profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DomainName {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.0
    }
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for DomainName {}

impl Hash for DomainName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of days a freshly registered domain keeps its ranking boost.
pub const BEGINNER_BOOST_WINDOW_DAYS: i64 = 7;

/// Profiles with fewer completed tasks than this carry the UI-facing
/// "beginner" marker. Distinct from the rookie (level 1) classification used
/// by the ranking quota.
pub const BEGINNER_TASK_CEILING: u32 = 3;

/// Per-domain reputation record for one freelancer.
///
/// Invariants maintained by the rating updater:
/// - `quality_score == round2(rating_sum / completed_tasks)` once any task is
///   rated, exactly 0.0 before that;
/// - `reliability_score` stays within [0, 100];
/// - `level` is in 1..=4 and never regresses under the rating flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainProfile {
    pub domain_name: DomainName,
    pub quality_score: f64,
    pub reliability_score: f64,
    pub level: u8,
    pub completed_tasks: u32,
    pub on_time_completions: u32,
    pub total_assigned: u32,
    pub cancellations: u32,
    pub rating_sum: f64,
    pub beginner_boost_expires_at: DateTime<Utc>,
}

impl DomainProfile {
    /// A brand-new registration: level 1, no history, full reliability, and a
    /// fresh boost window. The window is never renewed later.
    pub fn fresh(domain_name: DomainName, now: DateTime<Utc>) -> Self {
        Self {
            domain_name,
            quality_score: 0.0,
            reliability_score: 100.0,
            level: 1,
            completed_tasks: 0,
            on_time_completions: 0,
            total_assigned: 0,
            cancellations: 0,
            rating_sum: 0.0,
            beginner_boost_expires_at: now + Duration::days(BEGINNER_BOOST_WINDOW_DAYS),
        }
    }

    pub fn boost_active(&self, now: DateTime<Utc>) -> bool {
        self.beginner_boost_expires_at > now
    }

    pub fn is_beginner(&self) -> bool {
        self.completed_tasks < BEGINNER_TASK_CEILING
    }

    pub fn summary_view(&self, now: DateTime<Utc>) -> DomainProfileView {
        DomainProfileView {
            domain_name: self.domain_name.as_str().to_string(),
            level: self.level,
            level_label: super::leveling::level_label(self.level),
            quality_score: self.quality_score,
            reliability_score: self.reliability_score,
            completed_tasks: self.completed_tasks,
            is_beginner: self.is_beginner(),
            beginner_boost_active: self.boost_active(now),
            beginner_boost_expires_at: self.beginner_boost_expires_at,
        }
    }
}

/// Case-insensitive profile lookup. Absence is not an error here; callers
/// decide whether a missing registration matters.
pub fn find_domain<'a>(profiles: &'a [DomainProfile], name: &DomainName) -> Option<&'a DomainProfile> {
    profiles.iter().find(|profile| profile.domain_name == *name)
}

pub fn find_domain_mut<'a>(
    profiles: &'a mut [DomainProfile],
    name: &DomainName,
) -> Option<&'a mut DomainProfile> {
    profiles.iter_mut().find(|profile| profile.domain_name == *name)
}

/// Round to two decimals, matching how scores are published to clients.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Marketplace account roles. `Both` accounts post tasks and work on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Freelancer,
    Client,
    Both,
}

impl Role {
    /// Freelancer-capable accounts must register at least one domain.
    pub const fn requires_domains(self) -> bool {
        !matches!(self, Role::Client)
    }
}

/// Stored account record with the embedded per-domain reputation array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub domains: Vec<DomainProfile>,
}

impl UserRecord {
    pub fn domain(&self, name: &DomainName) -> Option<&DomainProfile> {
        find_domain(&self.domains, name)
    }

    pub fn domain_mut(&mut self, name: &DomainName) -> Option<&mut DomainProfile> {
        find_domain_mut(&mut self.domains, name)
    }
}

/// Availability declared by a freelancer when applying to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Busy,
}

/// Raw application entry embedded on a task. Ranking enriches these with the
/// applicant's domain profile on demand; nothing derived is stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub freelancer_id: UserId,
    pub applied_at: DateTime<Utc>,
    pub availability_status: AvailabilityStatus,
}

/// Task market segment. Company tasks gate applications on reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSegment {
    Individual,
    Company,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Difficulty tier used by the pricing advisory. Serialized as 1/2/3 on the
/// wire; unknown tiers are rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn tier(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("difficulty must be 1 (easy), 2 (medium), or 3 (hard), got {0}")]
pub struct UnknownDifficulty(pub u8);

impl TryFrom<u8> for Difficulty {
    type Error = UnknownDifficulty;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        match tier {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(UnknownDifficulty(other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.tier()
    }
}

/// Advisory budget range computed once at task creation and frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRange {
    pub min: u32,
    pub max: u32,
}

impl PricingRange {
    /// Display-time comparison of the client's chosen budget against the
    /// advisory range. Never re-validated beyond this.
    pub fn classify(&self, budget: u32) -> BudgetPosition {
        if budget < self.min {
            BudgetPosition::BelowRange
        } else if budget > self.max {
            BudgetPosition::AboveRange
        } else {
            BudgetPosition::WithinRange
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPosition {
    BelowRange,
    WithinRange,
    AboveRange,
}

impl BudgetPosition {
    pub const fn advisory_note(self) -> &'static str {
        match self {
            BudgetPosition::BelowRange => {
                "budget is below the recommended range; expect fewer applicants"
            }
            BudgetPosition::WithinRange => "budget is within the recommended range",
            BudgetPosition::AboveRange => {
                "budget is above market rate; high applicant interest expected"
            }
        }
    }
}

/// Stored task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub segment: TaskSegment,
    pub domain: DomainName,
    pub duration_days: u32,
    pub budget: u32,
    pub difficulty: Difficulty,
    pub recommended_budget_range: PricingRange,
    pub client_id: UserId,
    pub applicants: Vec<Application>,
    pub selected_freelancer_id: Option<UserId>,
    pub status: TaskStatus,
    pub deadline: DateTime<Utc>,
    pub rating: Option<u8>,
    pub completed_on_time: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn has_applicant(&self, freelancer_id: &UserId) -> bool {
        self.applicants
            .iter()
            .any(|application| application.freelancer_id == *freelancer_id)
    }
}

/// Dashboard view of one domain profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainProfileView {
    pub domain_name: String,
    pub level: u8,
    pub level_label: &'static str,
    pub quality_score: f64,
    pub reliability_score: f64,
    pub completed_tasks: u32,
    pub is_beginner: bool,
    pub beginner_boost_active: bool,
    pub beginner_boost_expires_at: DateTime<Utc>,
}
