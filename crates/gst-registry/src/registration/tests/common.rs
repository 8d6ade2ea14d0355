use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::StoreBackend;
use crate::gstin::Gstin;
use crate::registration::{RegistrationService, SubmitRequest};
use crate::submissions::{InMemorySubmissionStore, StoreError, Submission, SubmissionStore};
use crate::verification::{GstVerifier, VerificationError, VerificationResult};

pub(super) const GSTIN: &str = "27AAAAA0000A1Z5";

/// Verifier answering every lookup with a canned outcome.
pub(super) struct StubVerifier {
    outcome: Result<(String, String), VerificationError>,
    calls: AtomicUsize,
}

impl StubVerifier {
    pub(super) fn names(legal_name: &str, firm_name: &str) -> Self {
        Self {
            outcome: Ok((legal_name.to_string(), firm_name.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing(error: VerificationError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GstVerifier for StubVerifier {
    async fn verify(&self, gstn: &Gstin) -> Result<VerificationResult, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .map(|(legal_name, firm_name)| VerificationResult {
                gstn: gstn.clone(),
                legal_name,
                firm_name,
            })
    }
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

#[async_trait]
impl SubmissionStore for UnavailableStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn insert(&self, _submission: Submission) -> Result<Gstin, StoreError> {
        Err(StoreError::Unavailable(
            "connection refused (os error 111)".to_string(),
        ))
    }

    async fn fetch(&self, _gstn: &Gstin) -> Result<Option<Submission>, StoreError> {
        Err(StoreError::Unavailable(
            "connection refused (os error 111)".to_string(),
        ))
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(
            "connection refused (os error 111)".to_string(),
        ))
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) type MemoryService = RegistrationService<StubVerifier, InMemorySubmissionStore>;

pub(super) fn build_service(
    verifier: StubVerifier,
) -> (Arc<MemoryService>, Arc<StubVerifier>, Arc<InMemorySubmissionStore>) {
    let verifier = Arc::new(verifier);
    let store = Arc::new(InMemorySubmissionStore::default());
    let service = Arc::new(RegistrationService::new(verifier.clone(), store.clone()));
    (service, verifier, store)
}

pub(super) fn acme_verifier() -> StubVerifier {
    StubVerifier::names("ACME PVT LTD", "Acme")
}

pub(super) fn submit_request() -> SubmitRequest {
    SubmitRequest {
        gstn: Some(GSTIN.to_string()),
        legal_name: Some("ACME PVT LTD".to_string()),
        firm_name: Some("Acme".to_string()),
        name1: Some("Jane".to_string()),
        name2: None,
        contact: Some("9999999999".to_string()),
    }
}

pub(super) fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializes")))
        .expect("request builds")
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("response is JSON")
}
