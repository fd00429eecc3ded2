use crate::cli::ServeArgs;
use crate::demo::demo_program;
use crate::infra::{AppState, InMemoryApplicantRepository, InMemoryProgramRepository};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use benefit_intake::applicant::ApplicantService;
use benefit_intake::config::AppConfig;
use benefit_intake::error::AppError;
use benefit_intake::telemetry;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let applicants = Arc::new(InMemoryApplicantRepository::default());
    let programs = Arc::new(InMemoryProgramRepository::new([demo_program()?]));
    let applicant_service = Arc::new(ApplicantService::new(
        applicants,
        programs,
        config.intake.clone(),
    ));

    let app = with_intake_routes(applicant_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_locale = %config.intake.default_locale,
        max_updates = config.intake.max_updates,
        "benefit intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
