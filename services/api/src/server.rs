use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState};
use crate::routes::with_questionnaire_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use clinicshield::config::AppConfig;
use clinicshield::error::AppError;
use clinicshield::questionnaire::{InMemoryQuestionnaireRepository, QuestionnaireService};
use clinicshield::telemetry;
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
    if let Some(path) = args.catalog_csv.take() {
        config.questionnaire.catalog_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let catalog = load_catalog(config.questionnaire.catalog_csv.as_deref())?;
    let summary = catalog.seed_summary();
    info!(
        standards = summary.standards,
        assertions = summary.assertions,
        evidence_items = summary.evidence_items,
        "evidence catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryQuestionnaireRepository::default());
    let service = Arc::new(QuestionnaireService::new(
        repository,
        Arc::new(catalog),
        config.questionnaire.dspt_year.clone(),
    ));

    let app = with_questionnaire_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, dspt_year = %config.questionnaire.dspt_year, "clinicshield questionnaire service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
