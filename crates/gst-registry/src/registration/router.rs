use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::debug;

use super::service::{RegistrationService, SubmitRequest, VerifyRequest};
use crate::submissions::SubmissionStore;
use crate::verification::GstVerifier;

/// Router builder exposing the verify, submit and health endpoints.
pub fn registration_router<V, S>(service: Arc<RegistrationService<V, S>>) -> Router
where
    V: GstVerifier + ?Sized + 'static,
    S: SubmissionStore + ?Sized + 'static,
{
    Router::new()
        .route("/api/verify_gst", post(verify_handler::<V, S>))
        .route("/submit", post(submit_handler::<V, S>))
        .route("/healthz", get(healthz_handler::<V, S>))
        .with_state(service)
}

// Unparseable bodies are handled like an empty object so the caller still
// gets the uniform error shape.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!(error = %rejection, "treating unreadable request body as empty");
            T::default()
        }
    }
}

pub(crate) async fn verify_handler<V, S>(
    State(service): State<Arc<RegistrationService<V, S>>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response
where
    V: GstVerifier + ?Sized + 'static,
    S: SubmissionStore + ?Sized + 'static,
{
    let request = body_or_default(payload);
    match service.verify(request.gstn.as_deref().unwrap_or_default()).await {
        Ok(result) => {
            let payload = json!({
                "ok": true,
                "gstn": result.gstn,
                "legal_name": result.legal_name,
                "firm_name": result.firm_name,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response_with(service.diagnostics()),
    }
}

pub(crate) async fn submit_handler<V, S>(
    State(service): State<Arc<RegistrationService<V, S>>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response
where
    V: GstVerifier + ?Sized + 'static,
    S: SubmissionStore + ?Sized + 'static,
{
    let request = body_or_default(payload);
    match service.submit(request).await {
        Ok(id) => (StatusCode::OK, Json(json!({ "ok": true, "id": id }))).into_response(),
        Err(err) => err.into_response_with(service.diagnostics()),
    }
}

pub(crate) async fn healthz_handler<V, S>(
    State(service): State<Arc<RegistrationService<V, S>>>,
) -> Response
where
    V: GstVerifier + ?Sized + 'static,
    S: SubmissionStore + ?Sized + 'static,
{
    match service.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(err) => {
            let payload = json!({
                "status": "degraded",
                "db": err.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}
