use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::gstin::GstinError;
use crate::submissions::StoreError;
use crate::verification::VerificationError;

const DUPLICATE_MESSAGE: &str = "This GSTIN already exists.";
const STORAGE_MESSAGE: &str = "Could not save the submission. Please try again later.";

/// Every way a `verify` or `submit` call can fail.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Invalid(#[from] GstinError),
    #[error("Please verify GSTIN and fill required fields.")]
    MissingFields,
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistrationError {
    pub fn status(&self) -> StatusCode {
        match self {
            RegistrationError::Invalid(_) | RegistrationError::MissingFields => {
                StatusCode::BAD_REQUEST
            }
            RegistrationError::Verification(err) => match err {
                VerificationError::Gateway(_) | VerificationError::InvalidResponse => {
                    StatusCode::BAD_GATEWAY
                }
                VerificationError::Rejected(_) => StatusCode::BAD_REQUEST,
                VerificationError::NotFound => StatusCode::NOT_FOUND,
                VerificationError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RegistrationError::Store(StoreError::Duplicate) => StatusCode::CONFLICT,
            RegistrationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable discriminator for the form script.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            RegistrationError::Store(StoreError::Duplicate) => Some("duplicate"),
            _ => None,
        }
    }

    /// Text that is safe to show the caller. Storage faults stay generic.
    pub fn public_message(&self) -> String {
        match self {
            RegistrationError::Store(StoreError::Duplicate) => DUPLICATE_MESSAGE.to_string(),
            RegistrationError::Store(_) => STORAGE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Render the uniform `{ok:false, message[, code]}` body. With `diagnostics`
    /// set, internal failures also carry their underlying detail.
    pub fn into_response_with(self, diagnostics: bool) -> Response {
        let status = self.status();
        let mut body = json!({
            "ok": false,
            "message": self.public_message(),
        });
        if let Some(code) = self.code() {
            body["code"] = json!(code);
        }
        if diagnostics && status.is_server_error() {
            body["detail"] = json!(self.to_string());
        }
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
