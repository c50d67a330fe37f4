//! Student admissions: application intake, the applicant store, stream-wise merit
//! ranking, and the admin console surface.

pub mod admin;
pub mod domain;
pub mod export;
pub mod import;
pub mod intake;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use admin::{AdminAuthenticator, AdminSession, AuthError, ADMIN_TOKEN_HEADER};
pub use domain::{
    Applicant, ApplicantId, ApplicationId, ApplicationStatus, ApplicationSubmission, MarksInput,
    MeritStatusFilter, NewApplicant, Stream,
};
pub use export::{
    applicants_csv, write_applicants_csv, ExportError, APPLICANTS_CSV_FILENAME,
    APPLICANTS_CSV_HEADER,
};
pub use import::{
    read_submissions, read_submissions_from_path, ImportError, MalformedRow, SubmissionImport,
};
pub use intake::{IntakeGuard, IntakeViolation};
pub use ranking::{
    compute_merit_list, merit_order, MarkBand, MarkDistribution, MeritEntry, MeritList,
    MeritStats, StreamCounts,
};
pub use repository::{ApplicantRepository, InMemoryApplicantRepository, RepositoryError};
pub use router::{admissions_router, AdminApplicantView, AdmissionsState};
pub use service::{AdmissionsService, AdmissionsServiceError};
