use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use super::payload::interpret_payload;
use super::{GstVerifier, VerificationError, VerificationResult};
use crate::config::VerificationConfig;
use crate::gstin::Gstin;

/// Single-attempt HTTP client for the taxpayer lookup endpoint.
#[derive(Clone)]
pub struct HttpVerificationClient {
    http: reqwest::Client,
    endpoint: String,
    key_secret: Option<String>,
}

impl std::fmt::Debug for HttpVerificationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVerificationClient")
            .field("endpoint", &self.endpoint)
            .field("configured", &self.key_secret.is_some())
            .finish()
    }
}

impl HttpVerificationClient {
    pub fn new(config: &VerificationConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.key_secret.is_some()
    }
}

#[async_trait]
impl GstVerifier for HttpVerificationClient {
    #[tracing::instrument(skip_all, fields(gstn = %gstn))]
    async fn verify(&self, gstn: &Gstin) -> Result<VerificationResult, VerificationError> {
        let Some(secret) = self.key_secret.as_deref() else {
            warn!("GST_KEY_SECRET is not set; refusing to call verification service");
            return Err(VerificationError::Configuration);
        };

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("gstNo", gstn.as_str()), ("key_secret", secret)])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| {
                let detail = transport_detail(err);
                warn!(error = %detail, "verification request failed");
                VerificationError::Gateway(detail)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "verification service returned an error status");
            return Err(VerificationError::Gateway(format!(
                "upstream returned status {status}"
            )));
        }

        let body = response.bytes().await.map_err(|err| {
            let detail = transport_detail(err);
            warn!(error = %detail, "failed to read verification response body");
            VerificationError::Gateway(detail)
        })?;

        let outcome = interpret_payload(gstn, &body);
        match &outcome {
            Ok(_) => debug!("verification succeeded"),
            Err(err) => debug!(reason = %err, "verification did not produce an identity"),
        }
        outcome
    }
}

/// Flatten a transport failure and its source chain into one line, minus the
/// URL (it carries the secret).
fn transport_detail(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut detail = err.to_string();
    let mut cause = std::error::Error::source(&err);
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        cause = std::error::Error::source(inner);
    }
    if err.is_timeout() && !detail.contains("timed out") {
        detail.push_str(": operation timed out");
    }
    detail
}
