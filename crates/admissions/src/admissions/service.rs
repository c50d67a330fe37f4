use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    Applicant, ApplicantId, ApplicationStatus, ApplicationSubmission, MeritStatusFilter,
};
use super::export::{applicants_csv, ExportError};
use super::intake::{IntakeGuard, IntakeViolation};
use super::ranking::{compute_merit_list, merit_order, MeritList};
use super::repository::{ApplicantRepository, RepositoryError};

/// Service composing intake validation, the applicant store, and the ranking engine.
///
/// Every entry point (HTTP, CLI, tests) goes through here so the status filter and the
/// ranking rules are applied the same way everywhere.
pub struct AdmissionsService<R> {
    guard: IntakeGuard,
    repository: Arc<R>,
    status_filter: MeritStatusFilter,
}

impl<R> AdmissionsService<R>
where
    R: ApplicantRepository + 'static,
{
    pub fn new(repository: Arc<R>, status_filter: MeritStatusFilter) -> Self {
        Self {
            guard: IntakeGuard::default(),
            repository,
            status_filter,
        }
    }

    pub fn status_filter(&self) -> MeritStatusFilter {
        self.status_filter
    }

    /// Validate and persist a new application.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Applicant, AdmissionsServiceError> {
        self.submit_at(submission, Utc::now())
    }

    pub fn submit_at(
        &self,
        submission: ApplicationSubmission,
        received_at: DateTime<Utc>,
    ) -> Result<Applicant, AdmissionsServiceError> {
        let applicant = self.guard.validate(submission, received_at).map_err(|err| {
            debug!(error = %err, "application rejected at intake");
            err
        })?;

        if self.repository.find_by_email(&applicant.email)?.is_some() {
            warn!(email = %applicant.email, "duplicate application rejected");
            return Err(IntakeViolation::DuplicateEmail(applicant.email).into());
        }

        let stored = self.repository.insert(applicant).map_err(|err| match err {
            RepositoryError::Conflict { email } => {
                warn!(email = %email, "duplicate application rejected at write");
                AdmissionsServiceError::Intake(IntakeViolation::DuplicateEmail(email))
            }
            other => other.into(),
        })?;

        info!(
            applicant_id = %stored.id.0,
            application_id = %stored.application_id.0,
            stream = %stored.stream,
            marks = stored.marks,
            "application accepted"
        );
        Ok(stored)
    }

    /// Merit list over the applicants admitted by the configured status filter.
    pub fn merit_list(&self) -> Result<MeritList, AdmissionsServiceError> {
        self.merit_list_with(self.status_filter)
    }

    pub fn merit_list_with(
        &self,
        filter: MeritStatusFilter,
    ) -> Result<MeritList, AdmissionsServiceError> {
        let selected: Vec<Applicant> = self
            .repository
            .find_all()?
            .into_iter()
            .filter(|applicant| filter.admits(applicant))
            .collect();

        let merit = compute_merit_list(&selected);
        debug!(
            filter = filter.label(),
            total = merit.stats.total_count,
            science = merit.stats.stream_counts.science,
            arts = merit.stats.stream_counts.arts,
            commerce = merit.stats.stream_counts.commerce,
            "merit list computed"
        );
        Ok(merit)
    }

    /// Every stored applicant in insertion order, regardless of status.
    pub fn applicants(&self) -> Result<Vec<Applicant>, AdmissionsServiceError> {
        Ok(self.repository.find_all()?)
    }

    /// Every stored applicant in merit order, for the admin console.
    pub fn ranked_applicants(&self) -> Result<Vec<Applicant>, AdmissionsServiceError> {
        let applicants = self.repository.find_all()?;
        Ok(merit_order(&applicants).into_iter().cloned().collect())
    }

    pub fn get(&self, id: &ApplicantId) -> Result<Applicant, AdmissionsServiceError> {
        let applicant = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(applicant)
    }

    /// Record an admin review decision. This is the only change a record sees after intake.
    pub fn update_status(
        &self,
        id: &ApplicantId,
        status: ApplicationStatus,
    ) -> Result<Applicant, AdmissionsServiceError> {
        let updated = self.repository.update_status(id, status)?;
        info!(applicant_id = %id.0, status = status.label(), "application status updated");
        Ok(updated)
    }

    /// Ranked CSV sheet of every applicant.
    pub fn export_csv(&self) -> Result<Vec<u8>, AdmissionsServiceError> {
        let applicants = self.repository.find_all()?;
        Ok(applicants_csv(&applicants)?)
    }
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
