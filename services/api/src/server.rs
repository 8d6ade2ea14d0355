use crate::cli::ServeArgs;
use crate::infra::{build_service, cors_layer, open_store, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use gst_registry::config::AppConfig;
use gst_registry::error::AppError;
use gst_registry::telemetry;
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

    let store = open_store(&config).await?;
    if args.skip_migrations {
        info!("skipping schema migrations");
    } else {
        store.migrate().await?;
        info!(backend = store.backend().label(), "schema migrations applied");
    }
    let backend = store.backend();
    let service = build_service(&config, store)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let mut app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);
    if let Some(cors) = cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = backend.label(),
        debug = config.debug,
        "GST registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) async fn migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = open_store(&config).await?;
    store.migrate().await?;
    info!(backend = store.backend().label(), "schema migrations applied");
    Ok(())
}
