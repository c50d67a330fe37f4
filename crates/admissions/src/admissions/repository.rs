use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Applicant, ApplicantId, ApplicationId, ApplicationStatus, NewApplicant};
use super::intake::normalize_email;

/// Storage abstraction so the service and ranking can be exercised without a database.
pub trait ApplicantRepository: Send + Sync {
    /// Persist a new applicant. Must reject a second record for the same email
    /// (case-insensitively) atomically with the write.
    fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError>;
    fn find_all(&self) -> Result<Vec<Applicant>, RepositoryError>;
    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    fn update_status(
        &self,
        id: &ApplicantId,
        status: ApplicationStatus,
    ) -> Result<Applicant, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("an applicant with email '{email}' already exists")]
    Conflict { email: String },
    #[error("applicant not found")]
    NotFound,
    #[error("data unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<Applicant>,
    sequence: u64,
}

/// Process-local applicant store.
///
/// Records are kept in insertion order. `created_at` is clamped so it never runs
/// backwards relative to the previous insert, which keeps the ranking tie-break
/// consistent with submission order even if the wall clock steps back.
#[derive(Debug, Default, Clone)]
pub struct InMemoryApplicantRepository {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryApplicantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("applicant store lock poisoned".to_string()))
    }
}

impl ApplicantRepository for InMemoryApplicantRepository {
    fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        let mut state = self.lock()?;
        let email = normalize_email(&applicant.email);

        if state
            .records
            .iter()
            .any(|record| normalize_email(&record.email) == email)
        {
            return Err(RepositoryError::Conflict { email });
        }

        let created_at = match state.records.last() {
            Some(last) if last.created_at > applicant.created_at => last.created_at,
            _ => applicant.created_at,
        };

        state.sequence += 1;
        let sequence = state.sequence;
        let record = Applicant {
            id: ApplicantId(format!("stu-{sequence:06}")),
            application_id: ApplicationId(format!("APP{sequence:06}")),
            name: applicant.name,
            email,
            marks: applicant.marks,
            stream: applicant.stream.label().to_string(),
            course: applicant.course,
            status: Some(applicant.status),
            created_at,
        };

        state.records.push(record.clone());
        Ok(record)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError> {
        let email = normalize_email(email);
        let state = self.lock()?;
        Ok(state
            .records
            .iter()
            .find(|record| normalize_email(&record.email) == email)
            .cloned())
    }

    fn find_all(&self) -> Result<Vec<Applicant>, RepositoryError> {
        Ok(self.lock()?.records.clone())
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.records.iter().find(|record| &record.id == id).cloned())
    }

    fn update_status(
        &self,
        id: &ApplicantId,
        status: ApplicationStatus,
    ) -> Result<Applicant, RepositoryError> {
        let mut state = self.lock()?;
        let record = state
            .records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = Some(status);
        Ok(record.clone())
    }
}
