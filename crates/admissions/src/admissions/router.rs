use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::admin::{AdminAuthenticator, AuthError, ADMIN_TOKEN_HEADER};
use super::domain::{
    Applicant, ApplicantId, ApplicationId, ApplicationStatus, ApplicationSubmission,
    MeritStatusFilter, Stream,
};
use super::export::APPLICANTS_CSV_FILENAME;
use super::intake::IntakeViolation;
use super::ranking::MeritList;
use super::repository::{ApplicantRepository, RepositoryError};
use super::service::{AdmissionsService, AdmissionsServiceError};

/// Shared handler state: the service facade plus the admin session issuer.
pub struct AdmissionsState<R> {
    pub service: Arc<AdmissionsService<R>>,
    pub admin: Arc<AdminAuthenticator>,
}

impl<R> Clone for AdmissionsState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            admin: Arc::clone(&self.admin),
        }
    }
}

impl<R> AdmissionsState<R> {
    pub fn new(service: Arc<AdmissionsService<R>>, admin: Arc<AdminAuthenticator>) -> Self {
        Self { service, admin }
    }
}

/// Router builder exposing the application form, merit list, and admin endpoints.
pub fn admissions_router<R>(state: AdmissionsState<R>) -> Router
where
    R: ApplicantRepository + 'static,
{
    Router::new()
        .route("/apply", post(apply_handler::<R>))
        .route("/merit", get(merit_handler::<R>))
        .route("/students", get(students_handler::<R>))
        .route("/admin/login", post(admin_login_handler::<R>))
        .route("/admin/applicants", get(admin_applicants_handler::<R>))
        .route(
            "/admin/applicants/:applicant_id",
            get(admin_applicant_handler::<R>),
        )
        .route(
            "/admin/applicants/:applicant_id/status",
            patch(admin_status_handler::<R>),
        )
        .route("/admin/download/csv", get(admin_csv_handler::<R>))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyResponse {
    pub(crate) ok: bool,
    pub(crate) id: ApplicantId,
    pub(crate) application_id: ApplicationId,
    pub(crate) message: &'static str,
    pub(crate) student: StudentView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentView {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) marks: f64,
    pub(crate) stream: Stream,
    pub(crate) course: String,
    pub(crate) application_id: ApplicationId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MeritQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MeritResponse {
    #[serde(flatten)]
    pub(crate) merit: MeritList,
    pub(crate) status_filter: &'static str,
    pub(crate) generated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminLoginRequest {
    #[serde(default)]
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    pub(crate) status: String,
}

/// Applicant as listed in the admin console.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminApplicantView {
    pub id: ApplicantId,
    pub application_id: ApplicationId,
    pub name: String,
    pub email: String,
    pub marks: f64,
    pub stream: Stream,
    pub course: String,
    pub status: &'static str,
    pub applied_at: DateTime<Utc>,
}

impl From<&Applicant> for AdminApplicantView {
    fn from(applicant: &Applicant) -> Self {
        Self {
            id: applicant.id.clone(),
            application_id: applicant.application_id.clone(),
            name: applicant.name.clone(),
            email: applicant.email.clone(),
            marks: applicant.marks,
            stream: applicant.resolved_stream(),
            course: applicant.course.clone(),
            status: applicant.status_label(),
            applied_at: applicant.created_at,
        }
    }
}

pub(crate) async fn apply_handler<R>(
    State(state): State<AdmissionsState<R>>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    match state.service.submit(submission) {
        Ok(applicant) => {
            let stream = applicant.resolved_stream();
            let body = ApplyResponse {
                ok: true,
                id: applicant.id.clone(),
                application_id: applicant.application_id.clone(),
                message: "Application submitted successfully! Check the merit list to see your ranking.",
                student: StudentView {
                    name: applicant.name,
                    email: applicant.email,
                    marks: applicant.marks,
                    stream,
                    course: applicant.course,
                    application_id: applicant.application_id,
                },
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn merit_handler<R>(
    State(state): State<AdmissionsState<R>>,
    Query(query): Query<MeritQuery>,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    let filter = match query.status.as_deref() {
        None => state.service.status_filter(),
        Some(raw) => match MeritStatusFilter::parse(raw) {
            Some(filter) => filter,
            None => {
                return failure(
                    StatusCode::BAD_REQUEST,
                    format!("unknown status filter '{raw}': expected 'pending' or 'all'"),
                )
            }
        },
    };

    match state.service.merit_list_with(filter) {
        Ok(merit) => Json(MeritResponse {
            merit,
            status_filter: filter.label(),
            generated_at: Utc::now(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn students_handler<R>(State(state): State<AdmissionsState<R>>) -> Response
where
    R: ApplicantRepository + 'static,
{
    match state.service.applicants() {
        Ok(applicants) => Json(applicants).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_login_handler<R>(
    State(state): State<AdmissionsState<R>>,
    Json(request): Json<AdminLoginRequest>,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    match state.admin.login(&request.username, &request.password) {
        Ok(session) => Json(json!({
            "ok": true,
            "token": session.token,
            "expiresAt": session.expires_at,
            "message": "Login successful",
        }))
        .into_response(),
        Err(err) => failure(StatusCode::UNAUTHORIZED, err.to_string()),
    }
}

pub(crate) async fn admin_applicants_handler<R>(
    State(state): State<AdmissionsState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    if let Err(response) = authorize(&state.admin, &headers) {
        return response;
    }

    match state.service.ranked_applicants() {
        Ok(applicants) => {
            let views: Vec<AdminApplicantView> =
                applicants.iter().map(AdminApplicantView::from).collect();
            Json(views).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_applicant_handler<R>(
    State(state): State<AdmissionsState<R>>,
    headers: HeaderMap,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    if let Err(response) = authorize(&state.admin, &headers) {
        return response;
    }

    match state.service.get(&ApplicantId(applicant_id)) {
        Ok(applicant) => Json(AdminApplicantView::from(&applicant)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_status_handler<R>(
    State(state): State<AdmissionsState<R>>,
    headers: HeaderMap,
    Path(applicant_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    if let Err(response) = authorize(&state.admin, &headers) {
        return response;
    }

    let Some(status) = ApplicationStatus::parse(&request.status) else {
        return failure(
            StatusCode::BAD_REQUEST,
            format!(
                "invalid status '{}': must be pending, approved, or rejected",
                request.status
            ),
        );
    };

    match state
        .service
        .update_status(&ApplicantId(applicant_id), status)
    {
        Ok(applicant) => Json(AdminApplicantView::from(&applicant)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_csv_handler<R>(
    State(state): State<AdmissionsState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicantRepository + 'static,
{
    if let Err(response) = authorize(&state.admin, &headers) {
        return response;
    }

    match state.service.export_csv() {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{APPLICANTS_CSV_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn authorize(admin: &AdminAuthenticator, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::Unauthorized);

    token
        .and_then(|token| admin.verify(token))
        .map_err(|err| failure(StatusCode::UNAUTHORIZED, err.to_string()))
}

fn error_response(err: AdmissionsServiceError) -> Response {
    let status = match &err {
        AdmissionsServiceError::Intake(IntakeViolation::DuplicateEmail(_))
        | AdmissionsServiceError::Repository(RepositoryError::Conflict { .. }) => {
            StatusCode::CONFLICT
        }
        AdmissionsServiceError::Intake(_) => StatusCode::BAD_REQUEST,
        AdmissionsServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AdmissionsServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AdmissionsServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "admissions request failed");
    }

    failure(status, err.to_string())
}

fn failure(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "ok": false,
        "error": message,
    });
    (status, Json(payload)).into_response()
}
