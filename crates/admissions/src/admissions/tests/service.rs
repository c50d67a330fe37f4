use super::common::*;
use crate::admissions::domain::{
    ApplicantId, ApplicationStatus, ApplicationSubmission, MarksInput, MeritStatusFilter, Stream,
};
use crate::admissions::intake::IntakeViolation;
use crate::admissions::repository::{ApplicantRepository, RepositoryError};
use crate::admissions::service::{AdmissionsService, AdmissionsServiceError};
use std::sync::Arc;

#[test]
fn submit_normalizes_and_assigns_identifiers() {
    let (service, repository) = build_service();

    let mut raw = submission("  Asha Rao  ", "  Asha.Rao@Example.COM ", 91.0, "arts");
    raw.course = Some("  History ".to_string());
    let stored = service.submit_at(raw, at(0)).expect("submission accepted");

    assert_eq!(stored.name, "Asha Rao");
    assert_eq!(stored.email, "asha.rao@example.com");
    assert_eq!(stored.stream, "Arts");
    assert_eq!(stored.course, "History");
    assert_eq!(stored.status, Some(ApplicationStatus::Pending));
    assert_eq!(stored.created_at, at(0));
    assert!(stored.id.0.starts_with("stu-"));
    assert!(stored.application_id.0.starts_with("APP"));
    assert_eq!(repository.len(), 1);
}

#[test]
fn omitted_stream_defaults_to_science() {
    let (service, _) = build_service();

    let raw = ApplicationSubmission {
        name: Some("Dev Mehta".to_string()),
        email: Some("dev@example.com".to_string()),
        marks: Some(MarksInput::Text("78".to_string())),
        stream: None,
        course: None,
    };
    let stored = service.submit(raw).expect("submission accepted");

    assert_eq!(stored.resolved_stream(), Stream::Science);
    assert_eq!(stored.marks, 78.0);
    assert_eq!(stored.course, "");
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let (service, repository) = build_service();
    service
        .submit(submission("Original", "X@Y.com", 80.0, "Science"))
        .expect("first submission accepted");

    match service.submit(submission("Copycat", "x@y.com", 99.0, "Arts")) {
        Err(AdmissionsServiceError::Intake(IntakeViolation::DuplicateEmail(email))) => {
            assert_eq!(email, "x@y.com")
        }
        other => panic!("expected duplicate email rejection, got {other:?}"),
    }

    let merit = service.merit_list().expect("merit list");
    assert_eq!(merit.stats.total_count, 1);
    assert!(merit.arts.is_empty());
    assert_eq!(repository.len(), 1);
}

#[test]
fn store_conflict_at_write_is_reported_as_duplicate() {
    let service = AdmissionsService::new(Arc::new(RacingRepository), MeritStatusFilter::All);

    match service.submit(submission("Late", "late@example.com", 70.0, "Commerce")) {
        Err(AdmissionsServiceError::Intake(IntakeViolation::DuplicateEmail(email))) => {
            assert_eq!(email, "late@example.com")
        }
        other => panic!("expected duplicate email rejection, got {other:?}"),
    }
}

#[test]
fn validation_stops_at_first_failing_rule() {
    let (service, _) = build_service();

    let raw = ApplicationSubmission {
        name: Some("   ".to_string()),
        email: Some("not-an-email".to_string()),
        marks: Some(MarksInput::Number(120.0)),
        stream: Some("Medicine".to_string()),
        course: None,
    };
    assert!(matches!(
        service.submit(raw),
        Err(AdmissionsServiceError::Intake(IntakeViolation::MissingName))
    ));

    let raw = submission("Asha", "not-an-email", 120.0, "Medicine");
    assert!(matches!(
        service.submit(raw),
        Err(AdmissionsServiceError::Intake(IntakeViolation::InvalidEmail(_)))
    ));

    let raw = submission("Asha", "asha@example.com", 120.0, "Medicine");
    assert!(matches!(
        service.submit(raw),
        Err(AdmissionsServiceError::Intake(IntakeViolation::MarksOutOfRange(_)))
    ));

    let raw = submission("Asha", "asha@example.com", 88.0, "Medicine");
    assert!(matches!(
        service.submit(raw),
        Err(AdmissionsServiceError::Intake(IntakeViolation::UnknownStream(_)))
    ));
}

#[test]
fn missing_and_non_numeric_marks_are_distinguished() {
    let (service, _) = build_service();

    let mut raw = submission("Asha", "asha@example.com", 0.0, "Arts");
    raw.marks = None;
    assert!(matches!(
        service.submit(raw),
        Err(AdmissionsServiceError::Intake(IntakeViolation::MissingMarks))
    ));

    let mut raw = submission("Asha", "asha@example.com", 0.0, "Arts");
    raw.marks = Some(MarksInput::Text("eighty".to_string()));
    assert!(matches!(
        service.submit(raw),
        Err(AdmissionsServiceError::Intake(IntakeViolation::NonNumericMarks(_)))
    ));
}

#[test]
fn pending_filter_hides_reviewed_applicants() {
    let (service, _) = build_service();
    let approved = service
        .submit_at(submission("Approved", "a@example.com", 95.0, "Science"), at(0))
        .expect("accepted");
    service
        .submit_at(submission("Waiting", "w@example.com", 85.0, "Science"), at(1))
        .expect("accepted");
    service
        .update_status(&approved.id, ApplicationStatus::Approved)
        .expect("status updated");

    let pending = service.merit_list().expect("merit list");
    assert_eq!(names(&pending.science), vec!["Waiting"]);
    assert_eq!(pending.stats.total_count, 1);

    let everyone = service
        .merit_list_with(MeritStatusFilter::All)
        .expect("merit list");
    assert_eq!(names(&everyone.science), vec!["Approved", "Waiting"]);
}

#[test]
fn configured_filter_can_rank_everyone() {
    let (service, _) = build_service_with(MeritStatusFilter::All);
    let rejected = service
        .submit(submission("Rejected", "r@example.com", 66.0, "Commerce"))
        .expect("accepted");
    service
        .update_status(&rejected.id, ApplicationStatus::Rejected)
        .expect("status updated");

    let merit = service.merit_list().expect("merit list");
    assert_eq!(names(&merit.commerce), vec!["Rejected"]);
}

#[test]
fn update_status_propagates_not_found() {
    let (service, _) = build_service();

    match service.update_status(
        &ApplicantId("stu-404404".to_string()),
        ApplicationStatus::Approved,
    ) {
        Err(AdmissionsServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found error, got {other:?}"),
    }
}

#[test]
fn get_returns_stored_record() {
    let (service, repository) = build_service();
    let stored = service
        .submit(submission("Asha", "asha@example.com", 91.0, "Arts"))
        .expect("accepted");

    let fetched = service.get(&stored.id).expect("record present");
    assert_eq!(fetched, stored);
    assert_eq!(
        repository
            .find_by_email("ASHA@example.com")
            .expect("lookup succeeds"),
        Some(stored)
    );
}

#[test]
fn unavailable_store_surfaces_as_repository_error() {
    let service = AdmissionsService::new(
        Arc::new(UnavailableRepository),
        MeritStatusFilter::PendingOnly,
    );

    assert!(matches!(
        service.merit_list(),
        Err(AdmissionsServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert!(matches!(
        service.submit(submission("Asha", "asha@example.com", 91.0, "Arts")),
        Err(AdmissionsServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn ranked_applicants_and_export_follow_merit_order() {
    let (service, _) = build_service();
    service
        .submit_at(submission("Mid", "mid@example.com", 75.0, "Arts"), at(0))
        .expect("accepted");
    service
        .submit_at(submission("Top", "top@example.com", 98.0, "Commerce"), at(1))
        .expect("accepted");
    service
        .submit_at(submission("Tied Later", "late@example.com", 75.0, "Science"), at(2))
        .expect("accepted");

    let ranked = service.ranked_applicants().expect("ranked");
    let order: Vec<&str> = ranked.iter().map(|applicant| applicant.name.as_str()).collect();
    assert_eq!(order, vec!["Top", "Mid", "Tied Later"]);

    let csv = String::from_utf8(service.export_csv().expect("export")).expect("utf-8");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Rank,Name,Email,Marks,Stream,Course,Status,Applied At"
    );
    assert!(lines[1].starts_with("1,Top,top@example.com,98,Commerce,"));
    assert!(lines[2].starts_with("2,Mid,mid@example.com,75,Arts,"));
    assert!(lines[3].contains("pending"));
    assert_eq!(lines.len(), 4);
}
