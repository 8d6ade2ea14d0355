use crate::infra::{ApiService, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Extension;
use axum::Json;
use gst_registry::registration::registration_router;
use serde_json::json;
use std::sync::Arc;

const INDEX_HTML: &str = include_str!("../assets/index.html");

const STATIC_ASSETS: &[(&str, &str)] = &[
    ("app.js", include_str!("../assets/app.js")),
    ("styles.css", include_str!("../assets/styles.css")),
];

pub(crate) fn with_operational_routes(service: Arc<ApiService>) -> axum::Router {
    registration_router(service)
        .route("/", get(landing_page))
        .route("/static/:file", get(static_asset))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn landing_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn static_asset(Path(file): Path<String>) -> Response {
    match STATIC_ASSETS.iter().find(|(name, _)| *name == file) {
        Some((name, body)) => {
            let mime = mime_guess::from_path(name).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.essence_str().to_string())],
                *body,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "status": "not_found" }))).into_response(),
    }
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    #[tokio::test]
    async fn landing_page_renders_form() {
        let Html(body) = landing_page().await;
        assert!(body.contains("/api/verify_gst"));
        assert!(body.contains("/static/app.js"));
    }

    #[tokio::test]
    async fn static_asset_sets_content_type() {
        let response = static_asset(Path("styles.css".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content type present"),
            "text/css"
        );

        let response = static_asset(Path("app.js".to_string())).await;
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("javascript")));
    }

    #[tokio::test]
    async fn unknown_static_asset_is_not_found() {
        let response = static_asset(Path("../Cargo.toml".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let state = app_state(false);
        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_uses_prometheus_content_type() {
        let response = metrics_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content type present"),
            "text/plain; version=0.0.4"
        );
    }
}
