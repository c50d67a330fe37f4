use admissions::admissions::{
    AdmissionsService, AdmissionsServiceError, ApplicantRepository, ApplicationSubmission,
    IntakeViolation, MarksInput, MeritStatusFilter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Students the development store starts with so the merit page is never blank.
pub(crate) fn sample_submissions() -> Vec<ApplicationSubmission> {
    [
        ("Patil Pranav Maruti", "pranav@example.com", 99.0, "Science", "Computer Science"),
        ("Tejashree Sangram Patil", "tejashree@example.com", 99.0, "Science", "Engineering"),
        ("Alice Johnson", "alice@example.com", 92.0, "Science", "Computer Science"),
        ("Bob Smith", "bob@example.com", 88.0, "Arts", "English Literature"),
        ("Carol Davis", "carol@example.com", 90.0, "Commerce", "Business Administration"),
    ]
    .into_iter()
    .map(|(name, email, marks, stream, course)| ApplicationSubmission {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        marks: Some(MarksInput::Number(marks)),
        stream: Some(stream.to_string()),
        course: Some(course.to_string()),
    })
    .collect()
}

#[derive(Debug, Default)]
pub(crate) struct LoadOutcome {
    pub(crate) accepted: usize,
    /// One-based row number and the rule it broke.
    pub(crate) rejected: Vec<(usize, IntakeViolation)>,
}

/// Push numbered submissions through normal intake.
///
/// Rejected rows are logged and skipped; only a store failure aborts the load.
pub(crate) fn load_submissions<R, I>(
    service: &AdmissionsService<R>,
    rows: I,
) -> Result<LoadOutcome, AdmissionsServiceError>
where
    R: ApplicantRepository + 'static,
    I: IntoIterator<Item = (usize, ApplicationSubmission)>,
{
    let mut outcome = LoadOutcome::default();
    for (row, submission) in rows {
        match service.submit(submission) {
            Ok(_) => outcome.accepted += 1,
            Err(AdmissionsServiceError::Intake(violation)) => {
                warn!(row, reason = %violation, "submission skipped");
                outcome.rejected.push((row, violation));
            }
            Err(other) => return Err(other),
        }
    }
    Ok(outcome)
}

pub(crate) fn parse_status_filter(raw: &str) -> Result<MeritStatusFilter, String> {
    MeritStatusFilter::parse(raw)
        .ok_or_else(|| format!("unknown status filter '{raw}': expected 'pending' or 'all'"))
}
