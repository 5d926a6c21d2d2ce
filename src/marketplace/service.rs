use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Application, AvailabilityStatus, Difficulty, DomainName, DomainProfile, DomainProfileView,
    PricingRange, Role, TaskId, TaskRecord, TaskSegment, TaskStatus, UserId, UserRecord,
};
use super::history::{parse_history, HistoryImportError};
use super::matching::{Candidate, MatchingConfig, MatchingEngine, RankedApplicant};
use super::pricing::{PricingConfig, PricingEngine};
use super::rating::RatingEngine;
use super::repository::{RepositoryError, TaskRepository, UserRepository};

/// Reputation floor for applying to Company-segment tasks. Enforced at
/// application time, before the ranking engine ever sees the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompanyZoneGate {
    pub min_level: u8,
    pub min_quality_score: f64,
    pub min_reliability_score: f64,
}

impl Default for CompanyZoneGate {
    fn default() -> Self {
        Self {
            min_level: 3,
            min_quality_score: 4.0,
            min_reliability_score: 85.0,
        }
    }
}

impl CompanyZoneGate {
    fn met_by(&self, profile: &DomainProfile) -> bool {
        profile.level >= self.min_level
            && profile.quality_score >= self.min_quality_score
            && profile.reliability_score >= self.min_reliability_score
    }
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// Task-creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub segment: TaskSegment,
    pub domain: String,
    pub duration_days: u32,
    pub budget: u32,
    pub difficulty: Difficulty,
    pub client_id: UserId,
}

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TASK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("user-{id:06}"))
}

fn next_task_id() -> TaskId {
    let id = TASK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TaskId(format!("task-{id:06}"))
}

/// Facade composing the reputation, matching, and pricing engines over the
/// account and task stores. Each operation is a request-scoped computation;
/// the only shared-state hazard, the reputation read-modify-write, goes
/// through `UserRepository::mutate` so the store applies it atomically.
pub struct MarketplaceService<U, T> {
    users: Arc<U>,
    tasks: Arc<T>,
    rating: RatingEngine,
    matching: MatchingEngine,
    pricing: PricingEngine,
    company_zone: CompanyZoneGate,
}

impl<U, T> MarketplaceService<U, T>
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    pub fn new(users: Arc<U>, tasks: Arc<T>) -> Self {
        Self::with_configs(
            users,
            tasks,
            MatchingConfig::default(),
            PricingConfig::default(),
            CompanyZoneGate::default(),
        )
    }

    pub fn with_configs(
        users: Arc<U>,
        tasks: Arc<T>,
        matching: MatchingConfig,
        pricing: PricingConfig,
        company_zone: CompanyZoneGate,
    ) -> Self {
        Self {
            users,
            tasks,
            rating: RatingEngine::default(),
            matching: MatchingEngine::new(matching),
            pricing: PricingEngine::new(pricing),
            company_zone,
        }
    }

    /// Register an account. Freelancer-capable roles must bring at least one
    /// domain; duplicates in the submitted list collapse case-insensitively.
    pub fn register_user(&self, input: NewUser) -> Result<UserRecord, MarketplaceError> {
        if input.role.requires_domains() && input.domains.is_empty() {
            return Err(MarketplaceError::MissingDomains);
        }

        let now = Utc::now();
        let mut domains: Vec<DomainProfile> = Vec::new();
        for raw in &input.domains {
            let name = DomainName::new(raw);
            if domains.iter().all(|profile| profile.domain_name != name) {
                domains.push(DomainProfile::fresh(name, now));
            }
        }

        let record = UserRecord {
            id: next_user_id(),
            name: input.name,
            email: input.email,
            role: input.role,
            domains,
        };
        let stored = self.users.insert(record)?;
        info!(user_id = %stored.id.0, domains = stored.domains.len(), "registered user");
        Ok(stored)
    }

    /// Add a domain profile to an existing account. The profile starts at
    /// level 1 with a fresh boost window, like at signup.
    pub fn add_domain(
        &self,
        user_id: &UserId,
        domain: &str,
    ) -> Result<DomainProfile, MarketplaceError> {
        let name = DomainName::new(domain);
        let mut added: Option<DomainProfile> = None;
        let result = self.users.mutate(user_id, &mut |record| {
            if record.domain(&name).is_none() {
                let profile = DomainProfile::fresh(name.clone(), Utc::now());
                added = Some(profile.clone());
                record.domains.push(profile);
            }
        });

        match result {
            Ok(_) => added.ok_or_else(|| {
                MarketplaceError::DomainAlreadyRegistered(name.as_str().to_string())
            }),
            Err(RepositoryError::NotFound) => Err(MarketplaceError::FreelancerNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Dashboard view of an account's domain profiles.
    pub fn freelancer_domains(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<DomainProfileView>, MarketplaceError> {
        let record = self
            .users
            .fetch(user_id)?
            .ok_or(MarketplaceError::FreelancerNotFound)?;
        let now = Utc::now();
        Ok(record
            .domains
            .iter()
            .map(|profile| profile.summary_view(now))
            .collect())
    }

    /// Advisory budget range for a prospective task. Degrades to the flat
    /// per-day base when the domain has no completed history.
    pub fn budget_quote(
        &self,
        domain: &DomainName,
        duration_days: u32,
        difficulty: Difficulty,
    ) -> Result<PricingRange, MarketplaceError> {
        let budgets = self.tasks.completed_budgets(domain)?;
        let average = PricingEngine::domain_average(&budgets);
        Ok(self.pricing.quote(average, duration_days, difficulty))
    }

    /// Create a task. The advisory range is computed here once and frozen on
    /// the record; the deadline is creation time plus the stated duration.
    pub fn create_task(&self, input: NewTask) -> Result<TaskRecord, MarketplaceError> {
        if input.duration_days == 0 {
            return Err(MarketplaceError::InvalidDuration);
        }

        let domain = DomainName::new(&input.domain);
        let recommended = self.budget_quote(&domain, input.duration_days, input.difficulty)?;

        let now = Utc::now();
        let record = TaskRecord {
            id: next_task_id(),
            title: input.title,
            description: input.description,
            segment: input.segment,
            domain,
            duration_days: input.duration_days,
            budget: input.budget,
            difficulty: input.difficulty,
            recommended_budget_range: recommended,
            client_id: input.client_id,
            applicants: Vec::new(),
            selected_freelancer_id: None,
            status: TaskStatus::Open,
            deadline: now + Duration::days(i64::from(input.duration_days)),
            rating: None,
            completed_on_time: None,
            created_at: now,
        };
        let stored = self.tasks.insert(record)?;
        info!(
            task_id = %stored.id.0,
            domain = %stored.domain,
            min = recommended.min,
            max = recommended.max,
            "created task with advisory range"
        );
        Ok(stored)
    }

    /// Open-task board, optionally filtered to one domain, newest first.
    pub fn open_tasks(
        &self,
        domain: Option<&DomainName>,
    ) -> Result<Vec<TaskRecord>, MarketplaceError> {
        Ok(self.tasks.list_open(domain)?)
    }

    /// All tasks posted by one client, newest first.
    pub fn client_tasks(&self, client_id: &UserId) -> Result<Vec<TaskRecord>, MarketplaceError> {
        Ok(self.tasks.list_by_client(client_id)?)
    }

    pub fn task_detail(&self, task_id: &TaskId) -> Result<TaskRecord, MarketplaceError> {
        self.tasks
            .fetch(task_id)?
            .ok_or(MarketplaceError::TaskNotFound)
    }

    /// Apply to an open task. Applicants must be registered in the task's
    /// domain; Company-segment tasks additionally gate on reputation.
    pub fn apply_to_task(
        &self,
        task_id: &TaskId,
        freelancer_id: &UserId,
        availability_status: AvailabilityStatus,
    ) -> Result<TaskRecord, MarketplaceError> {
        let mut task = self
            .tasks
            .fetch(task_id)?
            .ok_or(MarketplaceError::TaskNotFound)?;

        if task.status != TaskStatus::Open {
            return Err(MarketplaceError::TaskNotOpen);
        }
        if task.has_applicant(freelancer_id) {
            return Err(MarketplaceError::AlreadyApplied);
        }

        let freelancer = self
            .users
            .fetch(freelancer_id)?
            .ok_or(MarketplaceError::FreelancerNotFound)?;
        let profile = freelancer
            .domain(&task.domain)
            .ok_or_else(|| MarketplaceError::DomainNotRegistered(task.domain.as_str().to_string()))?;

        if task.segment == TaskSegment::Company && !self.company_zone.met_by(profile) {
            return Err(MarketplaceError::CompanyZoneRequirements {
                min_level: self.company_zone.min_level,
                min_quality: self.company_zone.min_quality_score,
                min_reliability: self.company_zone.min_reliability_score,
            });
        }

        task.applicants.push(Application {
            freelancer_id: freelancer_id.clone(),
            applied_at: Utc::now(),
            availability_status,
        });
        self.tasks.update(task.clone())?;
        Ok(task)
    }

    /// Client selects one applicant. Moves the task to InProgress and bumps
    /// the freelancer's assignment counter in its own atomic update, separate
    /// from (and not transactional with) the task write.
    pub fn select_freelancer(
        &self,
        task_id: &TaskId,
        client_id: &UserId,
        freelancer_id: &UserId,
    ) -> Result<TaskRecord, MarketplaceError> {
        let mut task = self
            .tasks
            .fetch(task_id)?
            .ok_or(MarketplaceError::TaskNotFound)?;

        if task.client_id != *client_id {
            return Err(MarketplaceError::NotTaskOwner);
        }
        if task.status != TaskStatus::Open {
            return Err(MarketplaceError::TaskNotOpen);
        }
        if !task.has_applicant(freelancer_id) {
            return Err(MarketplaceError::NotAnApplicant);
        }

        task.selected_freelancer_id = Some(freelancer_id.clone());
        task.status = TaskStatus::InProgress;
        self.tasks.update(task.clone())?;

        let domain = task.domain.clone();
        match self.users.mutate(freelancer_id, &mut |record| {
            if let Some(profile) = record.domain_mut(&domain) {
                profile.total_assigned += 1;
            }
        }) {
            Ok(_) | Err(RepositoryError::NotFound) => {}
            Err(other) => return Err(other.into()),
        }

        info!(task_id = %task.id.0, freelancer_id = %freelancer_id.0, "selected freelancer");
        Ok(task)
    }

    /// Selected freelancer marks the task complete; on-time is judged against
    /// the frozen deadline.
    pub fn complete_task(
        &self,
        task_id: &TaskId,
        freelancer_id: &UserId,
    ) -> Result<TaskRecord, MarketplaceError> {
        let mut task = self
            .tasks
            .fetch(task_id)?
            .ok_or(MarketplaceError::TaskNotFound)?;

        if task.selected_freelancer_id.as_ref() != Some(freelancer_id) {
            return Err(MarketplaceError::NotSelectedFreelancer);
        }
        if task.status != TaskStatus::InProgress {
            return Err(MarketplaceError::TaskNotInProgress);
        }

        let now = Utc::now();
        task.completed_on_time = Some(now <= task.deadline);
        task.status = TaskStatus::Completed;
        self.tasks.update(task.clone())?;
        Ok(task)
    }

    /// Client rates a completed task. The stored rating doubles as the
    /// at-most-once receipt: a task already carrying one is a conflict, so a
    /// completion event can never double-count into the reputation.
    pub fn rate_task(
        &self,
        task_id: &TaskId,
        client_id: &UserId,
        rating: u8,
    ) -> Result<DomainProfile, MarketplaceError> {
        if !(1..=5).contains(&rating) {
            return Err(MarketplaceError::RatingOutOfRange(rating));
        }

        let mut task = self
            .tasks
            .fetch(task_id)?
            .ok_or(MarketplaceError::TaskNotFound)?;

        if task.client_id != *client_id {
            return Err(MarketplaceError::NotTaskOwner);
        }
        if task.status != TaskStatus::Completed {
            return Err(MarketplaceError::TaskNotCompleted);
        }
        if task.rating.is_some() {
            return Err(MarketplaceError::AlreadyRated);
        }
        let freelancer_id = task
            .selected_freelancer_id
            .clone()
            .ok_or(MarketplaceError::NoSelectedFreelancer)?;

        task.rating = Some(rating);
        self.tasks.update(task.clone())?;

        self.apply_rating(
            &freelancer_id,
            &task.domain,
            rating,
            task.completed_on_time.unwrap_or(false),
        )
    }

    /// Core reputation update: the seven-step quality/reliability/level
    /// recompute, executed inside one atomic store mutation. Trusts that the
    /// rating value was validated by the caller.
    pub fn apply_rating(
        &self,
        freelancer_id: &UserId,
        domain: &DomainName,
        rating: u8,
        on_time: bool,
    ) -> Result<DomainProfile, MarketplaceError> {
        let mut updated: Option<DomainProfile> = None;
        let result = self.users.mutate(freelancer_id, &mut |record| {
            if let Some(profile) = record.domain_mut(domain) {
                self.rating.apply(profile, rating, on_time);
                updated = Some(profile.clone());
            }
        });

        match result {
            Ok(_) => {
                let profile = updated.ok_or_else(|| {
                    MarketplaceError::DomainNotRegistered(domain.as_str().to_string())
                })?;
                info!(
                    freelancer_id = %freelancer_id.0,
                    domain = %profile.domain_name,
                    level = profile.level,
                    quality = profile.quality_score,
                    "applied rating"
                );
                Ok(profile)
            }
            Err(RepositoryError::NotFound) => Err(MarketplaceError::FreelancerNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Ranked applicant list for a task: at most 7 experienced + 3 rookies,
    /// experienced first. Applicants without a profile in the task's domain
    /// are dropped silently; an empty applicant set is an empty result.
    pub fn top_applicants(
        &self,
        task_id: &TaskId,
    ) -> Result<Vec<RankedApplicant>, MarketplaceError> {
        let task = self
            .tasks
            .fetch(task_id)?
            .ok_or(MarketplaceError::TaskNotFound)?;

        if task.applicants.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = task
            .applicants
            .iter()
            .map(|application| application.freelancer_id.clone())
            .collect();
        let records = self.users.fetch_many(&ids)?;
        let by_id: HashMap<&UserId, &UserRecord> =
            records.iter().map(|record| (&record.id, record)).collect();

        let mut candidates = Vec::new();
        for application in &task.applicants {
            let Some(record) = by_id.get(&application.freelancer_id) else {
                continue;
            };
            let Some(profile) = record.domain(&task.domain) else {
                continue;
            };
            candidates.push(Candidate {
                freelancer_id: record.id.clone(),
                name: record.name.clone(),
                email: record.email.clone(),
                profile: profile.clone(),
                availability_status: application.availability_status,
                applied_at: application.applied_at,
            });
        }

        Ok(self.matching.rank(candidates, Utc::now()))
    }

    /// Seed completed-task history from a CSV export so the pricing advisory
    /// has data before the marketplace has organically completed tasks.
    /// Returns how many rows were imported.
    pub fn import_history<R: Read>(&self, reader: R) -> Result<usize, MarketplaceError> {
        let rows = parse_history(reader)?;
        let now = Utc::now();
        let mut imported = 0;

        for row in rows {
            if !row.completed || row.budget == 0 {
                continue;
            }
            let record = TaskRecord {
                id: next_task_id(),
                title: row.title,
                description: String::new(),
                segment: TaskSegment::Individual,
                domain: row.domain,
                duration_days: row.duration_days,
                budget: row.budget,
                difficulty: row.difficulty,
                recommended_budget_range: PricingRange { min: 0, max: 0 },
                client_id: UserId("history-import".to_string()),
                applicants: Vec::new(),
                selected_freelancer_id: None,
                status: TaskStatus::Completed,
                deadline: now,
                rating: None,
                completed_on_time: None,
                created_at: now,
            };
            self.tasks.insert(record)?;
            imported += 1;
        }

        info!(imported, "imported completed-task history");
        Ok(imported)
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("freelancer not found")]
    FreelancerNotFound,
    #[error("task not found")]
    TaskNotFound,
    #[error("freelancer is not registered in domain: {0}")]
    DomainNotRegistered(String),
    #[error("domain is already registered: {0}")]
    DomainAlreadyRegistered(String),
    #[error("freelancers must select at least one domain")]
    MissingDomains,
    #[error("duration must be at least one day")]
    InvalidDuration,
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("task is not open")]
    TaskNotOpen,
    #[error("you have already applied to this task")]
    AlreadyApplied,
    #[error("this freelancer has not applied for the task")]
    NotAnApplicant,
    #[error("only the task owner may perform this action")]
    NotTaskOwner,
    #[error("you are not the selected freelancer")]
    NotSelectedFreelancer,
    #[error("task has no selected freelancer")]
    NoSelectedFreelancer,
    #[error("task is not in progress")]
    TaskNotInProgress,
    #[error("task is not yet completed")]
    TaskNotCompleted,
    #[error("task has already been rated")]
    AlreadyRated,
    #[error(
        "company zone requires level >= {min_level}, quality >= {min_quality}, \
         and reliability >= {min_reliability}% in this domain"
    )]
    CompanyZoneRequirements {
        min_level: u8,
        min_quality: f64,
        min_reliability: f64,
    },
    #[error(transparent)]
    History(#[from] HistoryImportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
