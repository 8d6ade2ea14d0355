use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{VerificationError, VerificationResult};
use crate::gstin::Gstin;

const DEFAULT_REJECTION: &str = "GST verification failed.";

#[derive(Debug, Default, Deserialize)]
struct TaxpayerInfo {
    #[serde(default)]
    lgnm: Option<Value>,
    #[serde(default, rename = "tradeNam")]
    trade_nam: Option<Value>,
}

/// Translate an upstream response body into a verification outcome.
///
/// Only a literal boolean `true` in `error` counts as a rejection. Name
/// fields that are missing, null or not strings read as empty.
pub fn interpret_payload(
    gstn: &Gstin,
    body: &[u8],
) -> Result<VerificationResult, VerificationError> {
    let payload: Value = serde_json::from_slice(body).map_err(|err| {
        warn!(error = %err, body_len = body.len(), "verification response is not JSON");
        VerificationError::InvalidResponse
    })?;
    let Some(object) = payload.as_object() else {
        warn!(kind = json_kind(&payload), "verification response is not a JSON object");
        return Err(VerificationError::InvalidResponse);
    };

    if object.get("error").and_then(Value::as_bool) == Some(true) {
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_REJECTION);
        return Err(VerificationError::Rejected(message.to_string()));
    }

    let info = match object.get("taxpayerInfo") {
        Some(value @ Value::Object(_)) => {
            TaxpayerInfo::deserialize(value).map_err(|err| {
                warn!(error = %err, "unexpected taxpayerInfo shape");
                VerificationError::InvalidResponse
            })?
        }
        _ => TaxpayerInfo::default(),
    };

    let legal_name = text_of(info.lgnm.as_ref());
    let firm_name = text_of(info.trade_nam.as_ref());

    if legal_name.is_empty() && firm_name.is_empty() {
        return Err(VerificationError::NotFound);
    }

    Ok(VerificationResult {
        gstn: gstn.clone(),
        legal_name,
        firm_name,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text_of(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gstin() -> Gstin {
        Gstin::parse("27AAAAA0000A1Z5").expect("valid GSTIN")
    }

    #[test]
    fn extracts_trimmed_names() {
        let body = br#"{"error":false,"taxpayerInfo":{"lgnm":" ACME PVT LTD ","tradeNam":"Acme\n","sts":"Active"}}"#;
        let result = interpret_payload(&gstin(), body).expect("verified");
        assert_eq!(result.gstn, gstin());
        assert_eq!(result.legal_name, "ACME PVT LTD");
        assert_eq!(result.firm_name, "Acme");
    }

    #[test]
    fn one_name_is_enough() {
        let body = br#"{"taxpayerInfo":{"lgnm":"ACME PVT LTD","tradeNam":null}}"#;
        let result = interpret_payload(&gstin(), body).expect("verified");
        assert_eq!(result.legal_name, "ACME PVT LTD");
        assert_eq!(result.firm_name, "");
    }

    #[test]
    fn error_flag_carries_upstream_message() {
        let body = br#"{"error":true,"message":"Invalid GSTIN"}"#;
        assert_eq!(
            interpret_payload(&gstin(), body),
            Err(VerificationError::Rejected("Invalid GSTIN".to_string()))
        );
    }

    #[test]
    fn error_flag_without_message_uses_generic_text() {
        let body = br#"{"error":true}"#;
        assert_eq!(
            interpret_payload(&gstin(), body),
            Err(VerificationError::Rejected(DEFAULT_REJECTION.to_string()))
        );
    }

    #[test]
    fn truthy_non_boolean_error_is_not_a_rejection() {
        let body = br#"{"error":"true","taxpayerInfo":{"lgnm":"ACME PVT LTD"}}"#;
        assert!(interpret_payload(&gstin(), body).is_ok());
    }

    #[test]
    fn blank_names_are_not_found() {
        for body in [
            &br#"{"error":false,"taxpayerInfo":{"lgnm":"  ","tradeNam":""}}"#[..],
            &br#"{"error":false,"taxpayerInfo":null}"#[..],
            &br#"{}"#[..],
        ] {
            assert_eq!(
                interpret_payload(&gstin(), body),
                Err(VerificationError::NotFound)
            );
        }
    }

    #[test]
    fn non_json_and_non_object_bodies_are_invalid() {
        for body in [&b"<html>502 Bad Gateway</html>"[..], &b"[1,2,3]"[..], &b""[..]] {
            assert_eq!(
                interpret_payload(&gstin(), body),
                Err(VerificationError::InvalidResponse)
            );
        }
    }

    #[test]
    fn json_kind_names_non_object_payloads() {
        assert_eq!(json_kind(&serde_json::json!([1, 2])), "array");
        assert_eq!(json_kind(&serde_json::json!("ok")), "string");
        assert_eq!(json_kind(&Value::Null), "null");
    }
}
