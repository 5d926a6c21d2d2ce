use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{DomainName, TaskId, TaskRecord, TaskStatus, UserId, UserRecord};

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Account store keyed by id, holding the embedded domain-profile array.
pub trait UserRepository: Send + Sync {
    fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError>;

    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;

    /// Fetch a batch of records; ids with no record are silently skipped.
    fn fetch_many(&self, ids: &[UserId]) -> Result<Vec<UserRecord>, RepositoryError>;

    /// Apply `mutate` to the stored record as a single atomic
    /// read-modify-write. Implementations must hold the record's write latch
    /// (or use a conditional single-document update) for the whole closure so
    /// concurrent reputation updates cannot be lost. Returns the record as
    /// persisted after the mutation.
    fn mutate(
        &self,
        id: &UserId,
        mutate: &mut dyn FnMut(&mut UserRecord),
    ) -> Result<UserRecord, RepositoryError>;
}

/// Task store queryable by domain and status for pricing history.
pub trait TaskRepository: Send + Sync {
    fn insert(&self, record: TaskRecord) -> Result<TaskRecord, RepositoryError>;

    fn fetch(&self, id: &TaskId) -> Result<Option<TaskRecord>, RepositoryError>;

    fn update(&self, record: TaskRecord) -> Result<(), RepositoryError>;

    /// Open tasks, optionally restricted to one domain, newest first.
    fn list_open(&self, domain: Option<&DomainName>) -> Result<Vec<TaskRecord>, RepositoryError>;

    /// Tasks posted by one client, newest first.
    fn list_by_client(&self, client_id: &UserId) -> Result<Vec<TaskRecord>, RepositoryError>;

    /// Budgets of completed tasks in the given domain (case-insensitive),
    /// restricted to positive amounts. Order is unspecified.
    fn completed_budgets(&self, domain: &DomainName) -> Result<Vec<u32>, RepositoryError>;
}

/// Mutex-backed store used by the server binary and the test suites. The
/// record lock is held across `mutate`, which is what makes the reputation
/// read-modify-write atomic here.
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    records: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("user repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("user repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_many(&self, ids: &[UserId]) -> Result<Vec<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("user repository mutex poisoned");
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    fn mutate(
        &self,
        id: &UserId,
        mutate: &mut dyn FnMut(&mut UserRecord),
    ) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("user repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        mutate(record);
        Ok(record.clone())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTaskRepository {
    records: Arc<Mutex<HashMap<TaskId, TaskRecord>>>,
}

impl TaskRepository for InMemoryTaskRepository {
    fn insert(&self, record: TaskRecord) -> Result<TaskRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("task repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &TaskId) -> Result<Option<TaskRecord>, RepositoryError> {
        let guard = self.records.lock().expect("task repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: TaskRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("task repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn list_open(&self, domain: Option<&DomainName>) -> Result<Vec<TaskRecord>, RepositoryError> {
        let guard = self.records.lock().expect("task repository mutex poisoned");
        let mut tasks: Vec<TaskRecord> = guard
            .values()
            .filter(|record| {
                record.status == TaskStatus::Open
                    && domain.map_or(true, |name| record.domain == *name)
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    fn list_by_client(&self, client_id: &UserId) -> Result<Vec<TaskRecord>, RepositoryError> {
        let guard = self.records.lock().expect("task repository mutex poisoned");
        let mut tasks: Vec<TaskRecord> = guard
            .values()
            .filter(|record| record.client_id == *client_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    fn completed_budgets(&self, domain: &DomainName) -> Result<Vec<u32>, RepositoryError> {
        let guard = self.records.lock().expect("task repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| {
                record.status == TaskStatus::Completed
                    && record.budget > 0
                    && record.domain == *domain
            })
            .map(|record| record.budget)
            .collect())
    }
}
