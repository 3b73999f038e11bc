//! Payload carried by a successful resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Join requirements of the resolved target, as reported by the remote side.
///
/// Serialized as its raw number so sink output matches the remote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum VerificationLevel {
    /// No security in place at all.
    Unknown,

    /// Nothing special is needed to get in.
    NoVerification,

    /// Account must be older than five minutes.
    FiveMinuteWait,

    /// Verified email and a ten minute wait.
    VerifiedEmailTenMinuteWait,

    /// Verified phone number.
    VerifiedPhone,

    /// A level this build doesn't know about yet.
    Other(u8),
}

impl VerificationLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            VerificationLevel::Unknown => 0,
            VerificationLevel::NoVerification => 1,
            VerificationLevel::FiveMinuteWait => 2,
            VerificationLevel::VerifiedEmailTenMinuteWait => 3,
            VerificationLevel::VerifiedPhone => 4,
            VerificationLevel::Other(n) => n,
        }
    }
}

impl From<u8> for VerificationLevel {
    fn from(value: u8) -> Self {
        match value {
            0 => VerificationLevel::Unknown,
            1 => VerificationLevel::NoVerification,
            2 => VerificationLevel::FiveMinuteWait,
            3 => VerificationLevel::VerifiedEmailTenMinuteWait,
            4 => VerificationLevel::VerifiedPhone,
            n => VerificationLevel::Other(n),
        }
    }
}

impl From<VerificationLevel> for u8 {
    fn from(value: VerificationLevel) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_u8().fmt(f)
    }
}

/// Structured result data for one successful lookup.
///
/// `document` keeps the full remote response so the sink can store more than
/// the three summary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub name: String,
    pub level: VerificationLevel,
    pub population: u64,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub document: serde_json::Value,
}

impl Payload {
    pub fn new(name: impl Into<String>, level: VerificationLevel, population: u64) -> Self {
        Self {
            name: name.into(),
            level,
            population,
            document: serde_json::Value::Null,
        }
    }

    pub fn with_document(mut self, document: serde_json::Value) -> Self {
        self.document = document;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, VerificationLevel::Unknown)]
    #[case(1, VerificationLevel::NoVerification)]
    #[case(2, VerificationLevel::FiveMinuteWait)]
    #[case(3, VerificationLevel::VerifiedEmailTenMinuteWait)]
    #[case(4, VerificationLevel::VerifiedPhone)]
    #[case(9, VerificationLevel::Other(9))]
    fn level_maps_from_raw_number(#[case] raw: u8, #[case] expected: VerificationLevel) {
        assert_eq!(VerificationLevel::from(raw), expected);
        assert_eq!(expected.as_u8(), raw);
    }

    #[test]
    fn payload_serializes_level_as_number_and_skips_null_document() {
        let p = Payload::new("Geometry Dash", VerificationLevel::FiveMinuteWait, 420);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["level"], 2);
        assert_eq!(v["population"], 420);
        assert!(v.get("document").is_none());
    }
}
