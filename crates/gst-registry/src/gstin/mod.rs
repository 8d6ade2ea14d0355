//! GSTIN normalization and structural validation.
//!
//! A GSTIN is 15 characters: a two digit state code, the ten character PAN
//! (five letters, four digits, one letter), an entity code, the literal `Z`
//! and a check character.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const GSTIN_LENGTH: usize = 15;

static GSTIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][A-Z0-9]Z[A-Z0-9]$")
        .expect("GSTIN pattern compiles")
});

/// A trimmed, uppercased identifier that passed the structural check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Gstin(String);

impl Gstin {
    /// Normalize `raw` and validate it, reporting the first rule that fails.
    pub fn parse(raw: &str) -> Result<Self, GstinError> {
        let candidate = normalize(raw);

        if candidate.is_empty() {
            return Err(GstinError::Required);
        }
        // chars, not bytes: multibyte input must still report a length error
        if candidate.chars().count() != GSTIN_LENGTH {
            return Err(GstinError::InvalidLength);
        }
        if !GSTIN_PATTERN.is_match(&candidate) {
            return Err(GstinError::InvalidFormat);
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Gstin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Gstin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim surrounding whitespace and uppercase.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GstinError {
    #[error("GSTIN is required.")]
    Required,
    #[error("GSTIN must be exactly 15 characters.")]
    InvalidLength,
    #[error("GSTIN format looks invalid.")]
    InvalidFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_identifier() {
        let gstin = Gstin::parse("27AAAAA0000A1Z5").expect("valid GSTIN");
        assert_eq!(gstin.as_str(), "27AAAAA0000A1Z5");
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let gstin = Gstin::parse("  29abcde1234f1zw \n").expect("normalizes");
        assert_eq!(gstin.to_string(), "29ABCDE1234F1ZW");
    }

    #[test]
    fn blank_input_is_required() {
        assert_eq!(Gstin::parse(""), Err(GstinError::Required));
        assert_eq!(Gstin::parse("   \t"), Err(GstinError::Required));
    }

    #[test]
    fn every_wrong_length_reports_length() {
        let base = "27AAAAA0000A1Z5AAAAA";
        for len in 1..=base.len() {
            if len == GSTIN_LENGTH {
                continue;
            }
            assert_eq!(
                Gstin::parse(&base[..len]),
                Err(GstinError::InvalidLength),
                "length {len}"
            );
        }
    }

    #[test]
    fn multibyte_input_counts_characters() {
        assert_eq!(
            Gstin::parse("27AAAAA0000A1Zé"),
            Err(GstinError::InvalidFormat)
        );
        assert_eq!(Gstin::parse("27AAAAA0000A1é"), Err(GstinError::InvalidLength));
    }

    #[test]
    fn structural_violations_report_format() {
        let cases = [
            "2XAAAAA0000A1Z5", // state code letter
            "271AAAA0000A1Z5", // PAN letters short
            "27AAAAAX000A1Z5", // PAN digits contain a letter
            "27AAAAA00001125", // PAN check char is a digit
            "27AAAAA0000A-Z5", // entity code punctuation
            "27AAAAA0000A1X5", // missing literal Z
            "27AAAAA0000A1Z*", // check char punctuation
            "27AAAAA0000A1 5", // embedded space
        ];
        for case in cases {
            assert_eq!(
                Gstin::parse(case),
                Err(GstinError::InvalidFormat),
                "{case}"
            );
        }
    }

    #[test]
    fn lowercase_z_is_normalized_before_matching() {
        assert!(Gstin::parse("27aaaaa0000a1z5").is_ok());
    }

    #[test]
    fn messages_match_form_copy() {
        assert_eq!(GstinError::Required.to_string(), "GSTIN is required.");
        assert_eq!(
            GstinError::InvalidLength.to_string(),
            "GSTIN must be exactly 15 characters."
        );
        assert_eq!(
            GstinError::InvalidFormat.to_string(),
            "GSTIN format looks invalid."
        );
    }
}
