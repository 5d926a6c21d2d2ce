//! Freelance marketplace core: per-domain reputation profiles, the leveling
//! state machine, the rating updater, applicant ranking with the rookie
//! visibility quota, and the rule-based pricing advisory, composed behind a
//! service facade and an HTTP router.

pub mod domain;
pub mod history;
pub mod leveling;
pub mod matching;
pub mod pricing;
pub mod rating;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    find_domain, Application, AvailabilityStatus, BudgetPosition, Difficulty, DomainName,
    DomainProfile, DomainProfileView, PricingRange, Role, TaskId, TaskRecord, TaskSegment,
    TaskStatus, UserId, UserRecord,
};
pub use history::{parse_history, HistoricalTask, HistoryImportError};
pub use leveling::{level_label, LevelPolicy, TierRequirement};
pub use matching::{Candidate, MatchingConfig, MatchingEngine, RankedApplicant};
pub use pricing::{PricingConfig, PricingEngine};
pub use rating::RatingEngine;
pub use repository::{
    InMemoryTaskRepository, InMemoryUserRepository, RepositoryError, TaskRepository,
    UserRepository,
};
pub use router::marketplace_router;
pub use service::{CompanyZoneGate, MarketplaceError, MarketplaceService, NewTask, NewUser};
