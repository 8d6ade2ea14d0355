use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{error, info, warn};

use super::error::RegistrationError;
use crate::gstin::{normalize, Gstin};
use crate::submissions::{StoreError, Submission, SubmissionStore};
use crate::verification::{GstVerifier, VerificationError, VerificationResult};

/// Body of `POST /api/verify_gst`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub gstn: Option<String>,
}

/// Body of `POST /submit`. Absent fields read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub gstn: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub legal_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub firm_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name1: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name2: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub contact: Option<String>,
}

// Scalars read as their text; null and containers read as absent, so one
// mistyped field does not discard the rest of the body.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn trimmed(value: Option<String>) -> String {
    value.map(|text| text.trim().to_string()).unwrap_or_default()
}

/// Service composing the validator, the verification client and the store.
pub struct RegistrationService<V: ?Sized, S: ?Sized> {
    verifier: Arc<V>,
    store: Arc<S>,
    diagnostics: bool,
}

impl<V, S> RegistrationService<V, S>
where
    V: GstVerifier + ?Sized + 'static,
    S: SubmissionStore + ?Sized + 'static,
{
    pub fn new(verifier: Arc<V>, store: Arc<S>) -> Self {
        Self {
            verifier,
            store,
            diagnostics: false,
        }
    }

    /// Include internal error detail in 500-class responses.
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    /// Validate `raw_gstn` and look it up upstream. Never touches the store.
    pub async fn verify(&self, raw_gstn: &str) -> Result<VerificationResult, RegistrationError> {
        let gstn = Gstin::parse(raw_gstn)?;

        match self.verifier.verify(&gstn).await {
            Ok(result) => {
                info!(gstn = %gstn, "GSTIN verified");
                Ok(result)
            }
            Err(err) => {
                match &err {
                    VerificationError::Configuration => {
                        error!(gstn = %gstn, "verification attempted without a configured secret")
                    }
                    VerificationError::Gateway(_) | VerificationError::InvalidResponse => {
                        warn!(gstn = %gstn, error = %err, "verification upstream failure")
                    }
                    VerificationError::Rejected(_) | VerificationError::NotFound => {
                        info!(gstn = %gstn, reason = %err, "GSTIN not verified")
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Persist a registration. The names are trusted as supplied by the caller.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Gstin, RegistrationError> {
        let raw_gstn = normalize(request.gstn.as_deref().unwrap_or_default());
        let legal_name = trimmed(request.legal_name);
        let firm_name = trimmed(request.firm_name);
        let name1 = trimmed(request.name1);
        let name2 = trimmed(request.name2);
        let contact = trimmed(request.contact);

        if [&raw_gstn, &legal_name, &firm_name, &name1, &contact]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(RegistrationError::MissingFields);
        }

        let gstn = Gstin::parse(&raw_gstn)?;

        let submission = Submission {
            gstn,
            legal_name,
            firm_name,
            name1,
            name2,
            contact,
            created_at: Utc::now(),
        };

        match self.store.insert(submission).await {
            Ok(key) => {
                info!(gstn = %key, backend = self.store.backend().label(), "submission stored");
                Ok(key)
            }
            Err(StoreError::Duplicate) => {
                info!(gstn = %raw_gstn, "rejected duplicate submission");
                Err(StoreError::Duplicate.into())
            }
            Err(err) => {
                error!(gstn = %raw_gstn, error = %err, "failed to store submission");
                Err(err.into())
            }
        }
    }

    /// Liveness of the backing store, reported by `/healthz`.
    pub async fn health(&self) -> Result<(), StoreError> {
        self.store.healthcheck().await
    }
}
