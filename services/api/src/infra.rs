use axum::http::{HeaderValue, Method};
use gst_registry::config::{AppConfig, CorsConfig};
use gst_registry::error::AppError;
use gst_registry::registration::RegistrationService;
use gst_registry::submissions::{self, SubmissionStore};
use gst_registry::verification::HttpVerificationClient;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

pub(crate) type ApiService = RegistrationService<HttpVerificationClient, dyn SubmissionStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Open the configured store. Fails fast when `DATABASE_URL` is missing or unsupported.
pub(crate) async fn open_store(config: &AppConfig) -> Result<Arc<dyn SubmissionStore>, AppError> {
    let backend = config.database.backend()?;
    let store = submissions::connect(backend, &config.database).await?;
    Ok(store)
}

pub(crate) fn build_service(
    config: &AppConfig,
    store: Arc<dyn SubmissionStore>,
) -> Result<Arc<ApiService>, AppError> {
    let verifier = HttpVerificationClient::new(&config.verification)?;
    if !verifier.is_configured() {
        warn!("GST_KEY_SECRET is not set; GSTIN verification requests will fail");
    }

    let service =
        RegistrationService::new(Arc::new(verifier), store).with_diagnostics(config.debug);
    Ok(Arc::new(service))
}

pub(crate) fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        warn!("CORS configured to allow all origins");
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    Some(layer.allow_origin(origins))
}
