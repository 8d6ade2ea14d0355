//! Lookup of a GSTIN against the external taxpayer verification service.

mod client;
mod payload;

use async_trait::async_trait;
use serde::Serialize;

use crate::gstin::Gstin;

pub use client::HttpVerificationClient;
pub use payload::interpret_payload;

/// Normalized identity returned by a successful lookup. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub gstn: Gstin,
    pub legal_name: String,
    pub firm_name: String,
}

/// Outbound verification seam so the workflow can run against fakes.
#[async_trait]
pub trait GstVerifier: Send + Sync {
    async fn verify(&self, gstn: &Gstin) -> Result<VerificationResult, VerificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Timeout, connection failure or a non-2xx upstream status.
    #[error("Error contacting verification service: {0}")]
    Gateway(String),
    #[error("Invalid response format from verification service.")]
    InvalidResponse,
    /// The upstream flagged the GSTIN itself as bad; the message is upstream-provided.
    #[error("{0}")]
    Rejected(String),
    #[error("Could not find Legal Name / Firm Name for this GSTIN.")]
    NotFound,
    #[error("Verification service is not configured.")]
    Configuration,
}
