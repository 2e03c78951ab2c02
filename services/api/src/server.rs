use crate::cli::ServeArgs;
use crate::infra::{catalog_aggregator, load_catalog, AppState};
use crate::routes::with_discovery_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_discovery::config::AppConfig;
use estate_discovery::discovery::DiscoveryService;
use estate_discovery::error::AppError;
use estate_discovery::telemetry;
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
    if let Some(dir) = args.catalog_dir.take() {
        config.discovery.catalog_dir = Some(dir);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = load_catalog(config.discovery.catalog_dir.as_deref())?;
    let discovery_service = Arc::new(DiscoveryService::new(catalog_aggregator(catalog)));

    let app = with_discovery_routes(discovery_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "estate discovery service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
