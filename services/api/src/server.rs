use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRemotePort};
use crate::routes::with_matching_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use offer_match::config::AppConfig;
use offer_match::error::AppError;
use offer_match::telemetry;
use offer_match::workflows::matching::MatchingService;
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

    let port = if config.sessions.seed_demo_data {
        InMemoryRemotePort::seeded()
    } else {
        InMemoryRemotePort::default()
    };
    let matching_service = Arc::new(MatchingService::new(
        Arc::new(port),
        config.sessions.max_sessions,
        config.sessions.idle_ttl,
    ));

    let app = with_matching_routes(matching_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        seeded = config.sessions.seed_demo_data,
        session_ttl_secs = config.sessions.idle_ttl.as_secs(),
        "offer matching service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
