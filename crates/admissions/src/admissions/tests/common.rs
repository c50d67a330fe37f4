use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::admissions::admin::AdminAuthenticator;
use crate::admissions::domain::{
    Applicant, ApplicantId, ApplicationId, ApplicationStatus, ApplicationSubmission, MarksInput,
    MeritStatusFilter, NewApplicant,
};
use crate::admissions::repository::{
    ApplicantRepository, InMemoryApplicantRepository, RepositoryError,
};
use crate::admissions::router::{admissions_router, AdmissionsState};
use crate::admissions::service::AdmissionsService;

pub(super) const ADMIN_USERNAME: &str = "admin";
pub(super) const ADMIN_PASSWORD: &str = "admin123";

pub(super) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
        + Duration::minutes(minutes)
}

pub(super) fn applicant(
    seq: u32,
    name: &str,
    marks: f64,
    stream: &str,
    created_minute: i64,
) -> Applicant {
    Applicant {
        id: ApplicantId(format!("stu-{seq:06}")),
        application_id: ApplicationId(format!("APP{seq:06}")),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        marks,
        stream: stream.to_string(),
        course: "General".to_string(),
        status: Some(ApplicationStatus::Pending),
        created_at: at(created_minute),
    }
}

pub(super) fn submission(
    name: &str,
    email: &str,
    marks: f64,
    stream: &str,
) -> ApplicationSubmission {
    ApplicationSubmission {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        marks: Some(MarksInput::Number(marks)),
        stream: Some(stream.to_string()),
        course: Some("Computer Science".to_string()),
    }
}

pub(super) fn build_service() -> (
    AdmissionsService<InMemoryApplicantRepository>,
    Arc<InMemoryApplicantRepository>,
) {
    build_service_with(MeritStatusFilter::PendingOnly)
}

pub(super) fn build_service_with(
    filter: MeritStatusFilter,
) -> (
    AdmissionsService<InMemoryApplicantRepository>,
    Arc<InMemoryApplicantRepository>,
) {
    let repository = Arc::new(InMemoryApplicantRepository::new());
    let service = AdmissionsService::new(repository.clone(), filter);
    (service, repository)
}

pub(super) fn admin() -> Arc<AdminAuthenticator> {
    Arc::new(AdminAuthenticator::new(
        ADMIN_USERNAME,
        ADMIN_PASSWORD,
        Duration::hours(24),
    ))
}

pub(super) fn state_for<R>(service: AdmissionsService<R>) -> AdmissionsState<R> {
    AdmissionsState::new(Arc::new(service), admin())
}

pub(super) fn router_for<R>(state: AdmissionsState<R>) -> axum::Router
where
    R: ApplicantRepository + 'static,
{
    admissions_router(state)
}

pub(super) fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn send(router: &axum::Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) async fn login(router: &axum::Router) -> String {
    let response = send(
        router,
        json_request(
            "POST",
            "/admin/login",
            &serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    payload
        .get("token")
        .and_then(Value::as_str)
        .expect("token issued")
        .to_string()
}

pub(super) fn names(entries: &[crate::admissions::ranking::MeritEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}

pub(super) struct UnavailableRepository;

impl ApplicantRepository for UnavailableRepository {
    fn insert(&self, _applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_email(&self, _email: &str) -> Result<Option<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_all(&self) -> Result<Vec<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &ApplicantId,
        _status: ApplicationStatus,
    ) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Store whose uniqueness check passes but whose write loses the race to another request.
pub(super) struct RacingRepository;

impl ApplicantRepository for RacingRepository {
    fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::Conflict {
            email: applicant.email,
        })
    }

    fn find_by_email(&self, _email: &str) -> Result<Option<Applicant>, RepositoryError> {
        Ok(None)
    }

    fn find_all(&self) -> Result<Vec<Applicant>, RepositoryError> {
        Ok(Vec::new())
    }

    fn fetch(&self, _id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Ok(None)
    }

    fn update_status(
        &self,
        _id: &ApplicantId,
        _status: ApplicationStatus,
    ) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::NotFound)
    }
}
