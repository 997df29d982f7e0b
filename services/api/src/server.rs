use crate::cli::ServeArgs;
use crate::infra::{http_assessor, AppState};
use crate::routes::with_risk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dropout_risk::config::AppConfig;
use dropout_risk::error::AppError;
use dropout_risk::telemetry;
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
    if let Some(endpoint) = args.prediction_url.take() {
        config.prediction.endpoint = endpoint;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let assessor = Arc::new(http_assessor(&config.prediction)?);

    let prediction_url = assessor.service().endpoint().to_string();
    let missing_category = assessor.encoder().policy();

    let app = with_risk_routes(assessor)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %prediction_url,
        ?missing_category,
        "dropout risk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
