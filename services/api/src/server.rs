use crate::cli::ServeArgs;
use crate::infra::{load_submissions, sample_submissions, AppState};
use crate::routes::with_admissions_routes;
use admissions::admissions::{
    AdminAuthenticator, AdmissionsService, AdmissionsState, InMemoryApplicantRepository,
};
use admissions::config::AppConfig;
use admissions::error::AppError;
use admissions::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicantRepository::new());
    let service = AdmissionsService::new(repository.clone(), config.merit.status_filter);
    if config.store.seed_sample_data {
        let seeded = load_submissions(&service, (1..).zip(sample_submissions()))?.accepted;
        info!(seeded, "seeded applicant store with sample students");
    }
    let service = Arc::new(service);

    let admin = Arc::new(AdminAuthenticator::from_config(&config.admin));
    let app = with_admissions_routes(AdmissionsState::new(service, admin))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        status_filter = config.merit.status_filter.label(),
        applicants = repository.len(),
        "admissions service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
