use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SealError, SealResult};

/// A plaintext payload plus its metadata. Immutable once sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub name: String,
    pub content_type: String,
    pub note: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    pub data: Vec<u8>,
}

impl Payload {
    /// Create a payload stamped with the current time and an empty note.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            note: String::new(),
            created_at_ms: now_ms(),
            data,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A normalized recipient identifier.
///
/// Normalization (trim + lowercase) happens exactly once, at construction,
/// so the same string is used for authentication, table lookup, and
/// key derivation between seal and unseal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecipientIdentity(String);

impl RecipientIdentity {
    pub fn new(raw: &str) -> SealResult<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(SealError::Config(
                "recipient identity must be non-empty".into(),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecipientIdentity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RecipientIdentity::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// An opaque locator naming stored envelope bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Rebuild a locator from bytes recovered out of a carrier image.
    pub fn from_utf8(bytes: Vec<u8>) -> SealResult<Self> {
        let value = String::from_utf8(bytes)
            .map_err(|_| SealError::Format("locator is not valid UTF-8".into()))?;
        if value.is_empty() {
            return Err(SealError::Format("locator is empty".into()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_normalization() {
        let id = RecipientIdentity::new("  0xAbCdEf0123  ").unwrap();
        assert_eq!(id.as_str(), "0xabcdef0123");
    }

    #[test]
    fn test_identity_stable_across_case() {
        let a = RecipientIdentity::new("0xAAA111").unwrap();
        let b = RecipientIdentity::new("0xaaa111").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_empty_rejected() {
        assert!(matches!(
            RecipientIdentity::new("   "),
            Err(SealError::Config(_))
        ));
    }

    #[test]
    fn test_locator_utf8_roundtrip() {
        let loc = Locator::new("envelopes/abc123");
        let restored = Locator::from_utf8(loc.as_bytes().to_vec()).unwrap();
        assert_eq!(restored, loc);
    }

    #[test]
    fn test_locator_invalid_utf8() {
        assert!(matches!(
            Locator::from_utf8(vec![0xFF, 0xFE]),
            Err(SealError::Format(_))
        ));
    }

    #[test]
    fn test_payload_note() {
        let p = Payload::new("a.txt", "text/plain", b"hi".to_vec()).with_note("for you");
        assert_eq!(p.note, "for you");
        assert!(p.created_at_ms > 0);
    }
}
