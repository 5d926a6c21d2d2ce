use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::marketplace::domain::{
    AvailabilityStatus, Difficulty, DomainName, DomainProfile, Role, TaskId, TaskRecord,
    TaskSegment, TaskStatus, UserId, UserRecord,
};
use crate::marketplace::matching::{Candidate, MatchingEngine};
use crate::marketplace::pricing::PricingEngine;
use crate::marketplace::rating::RatingEngine;
use crate::marketplace::repository::{
    InMemoryTaskRepository, InMemoryUserRepository, RepositoryError, TaskRepository,
    UserRepository,
};
use crate::marketplace::router::marketplace_router;
use crate::marketplace::service::{MarketplaceService, NewTask, NewUser};

pub(super) fn domain(name: &str) -> DomainName {
    DomainName::new(name)
}

pub(super) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Freshly registered profile: boost window open, no history.
pub(super) fn fresh_profile(name: &str) -> DomainProfile {
    DomainProfile::fresh(domain(name), now())
}

/// Profile with accumulated history and an expired boost window. The counters
/// are kept mutually consistent so rating updates stay meaningful.
pub(super) fn seasoned_profile(
    name: &str,
    completed_tasks: u32,
    quality_score: f64,
    reliability_score: f64,
    level: u8,
) -> DomainProfile {
    let on_time =
        (f64::from(completed_tasks) * reliability_score / 100.0).round() as u32;
    DomainProfile {
        domain_name: domain(name),
        quality_score,
        reliability_score,
        level,
        completed_tasks,
        on_time_completions: on_time,
        total_assigned: completed_tasks,
        cancellations: 0,
        rating_sum: quality_score * f64::from(completed_tasks),
        beginner_boost_expires_at: now() - Duration::days(30),
    }
}

pub(super) fn user(id: &str, name: &str, domains: Vec<DomainProfile>) -> UserRecord {
    UserRecord {
        id: UserId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        role: Role::Freelancer,
        domains,
    }
}

pub(super) fn client(id: &str) -> UserRecord {
    UserRecord {
        id: UserId(id.to_string()),
        name: "Client".to_string(),
        email: format!("{id}@example.com"),
        role: Role::Client,
        domains: Vec::new(),
    }
}

pub(super) fn open_task(id: &str, domain_name: &str, segment: TaskSegment) -> TaskRecord {
    let created = now();
    TaskRecord {
        id: TaskId(id.to_string()),
        title: format!("task {id}"),
        description: "test task".to_string(),
        segment,
        domain: domain(domain_name),
        duration_days: 5,
        budget: 3000,
        difficulty: Difficulty::Easy,
        recommended_budget_range: crate::marketplace::domain::PricingRange { min: 0, max: 0 },
        client_id: UserId("client-1".to_string()),
        applicants: Vec::new(),
        selected_freelancer_id: None,
        status: TaskStatus::Open,
        deadline: created + Duration::days(5),
        rating: None,
        completed_on_time: None,
        created_at: created,
    }
}

pub(super) fn candidate(
    id: &str,
    profile: DomainProfile,
    availability_status: AvailabilityStatus,
) -> Candidate {
    Candidate {
        freelancer_id: UserId(id.to_string()),
        name: format!("freelancer {id}"),
        email: format!("{id}@example.com"),
        profile,
        availability_status,
        applied_at: now(),
    }
}

pub(super) fn matching_engine() -> MatchingEngine {
    MatchingEngine::default()
}

pub(super) fn rating_engine() -> RatingEngine {
    RatingEngine::default()
}

pub(super) fn pricing_engine() -> PricingEngine {
    PricingEngine::default()
}

pub(super) type MemoryService =
    MarketplaceService<InMemoryUserRepository, InMemoryTaskRepository>;

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<InMemoryUserRepository>,
    Arc<InMemoryTaskRepository>,
) {
    let users = Arc::new(InMemoryUserRepository::default());
    let tasks = Arc::new(InMemoryTaskRepository::default());
    let service = Arc::new(MarketplaceService::new(users.clone(), tasks.clone()));
    (service, users, tasks)
}

pub(super) fn new_freelancer(name: &str, domains: &[&str]) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role: Role::Freelancer,
        domains: domains.iter().map(|d| d.to_string()).collect(),
    }
}

pub(super) fn new_task(domain: &str, client_id: &UserId) -> NewTask {
    NewTask {
        title: "test task".to_string(),
        description: "does something useful".to_string(),
        segment: TaskSegment::Individual,
        domain: domain.to_string(),
        duration_days: 5,
        budget: 3000,
        difficulty: Difficulty::Easy,
        client_id: client_id.clone(),
    }
}

pub(super) fn service_router(service: Arc<MemoryService>) -> axum::Router {
    marketplace_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// User store that always fails, for surfacing 500-class mappings.
pub(super) struct UnavailableUsers;

impl UserRepository for UnavailableUsers {
    fn insert(&self, _record: UserRecord) -> Result<UserRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_many(&self, _ids: &[UserId]) -> Result<Vec<UserRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mutate(
        &self,
        _id: &UserId,
        _mutate: &mut dyn FnMut(&mut UserRecord),
    ) -> Result<UserRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct UnavailableTasks;

impl TaskRepository for UnavailableTasks {
    fn insert(&self, _record: TaskRecord) -> Result<TaskRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &TaskId) -> Result<Option<TaskRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: TaskRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_open(
        &self,
        _domain: Option<&DomainName>,
    ) -> Result<Vec<TaskRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_by_client(&self, _client_id: &UserId) -> Result<Vec<TaskRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn completed_budgets(&self, _domain: &DomainName) -> Result<Vec<u32>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
