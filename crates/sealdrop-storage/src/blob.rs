//! Content-addressed envelope storage
//!
//! Object key layout: `envelopes/{blake3-hex}`. The locator handed back to
//! callers is the bare hash; it carries no path structure and is validated
//! before any read.

use opendal::Operator;

use sealdrop_core::{Locator, SealError, SealResult};

const ENVELOPE_PREFIX: &str = "envelopes/";

/// Store envelope bytes; returns the content-addressed locator.
pub async fn put_envelope(op: &Operator, bytes: &[u8]) -> SealResult<Locator> {
    if bytes.is_empty() {
        return Err(SealError::Storage("refusing to store empty envelope".into()));
    }
    let hash = blake3::hash(bytes).to_hex().to_string();
    let key = format!("{ENVELOPE_PREFIX}{hash}");

    op.write(&key, bytes.to_vec())
        .await
        .map_err(|e| SealError::Storage(format!("writing {key}: {e}")))?;

    tracing::debug!(key = %key, size = bytes.len(), "stored envelope");
    Ok(Locator::new(hash))
}

/// Fetch envelope bytes by locator.
pub async fn get_envelope(op: &Operator, locator: &Locator) -> SealResult<Vec<u8>> {
    validate_locator(locator)?;
    let key = format!("{ENVELOPE_PREFIX}{}", locator.as_str());

    let buffer = op.read(&key).await.map_err(|e| {
        if e.kind() == opendal::ErrorKind::NotFound {
            SealError::Storage(format!("envelope {} not found", locator.as_str()))
        } else {
            SealError::Storage(format!("reading {key}: {e}"))
        }
    })?;

    let bytes = buffer.to_vec();

    // Content addressing makes the fetch self-verifying
    let hash = blake3::hash(&bytes).to_hex().to_string();
    if hash != locator.as_str() {
        tracing::warn!(locator = %locator, "fetched envelope does not match its locator");
        return Err(SealError::Storage(
            "fetched envelope does not match its locator".into(),
        ));
    }

    Ok(bytes)
}

/// Locators extracted from a carrier are attacker-controlled; only a bare
/// BLAKE3 hex hash is accepted as an object name.
fn validate_locator(locator: &Locator) -> SealResult<()> {
    let value = locator.as_str();
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SealError::Format("locator is not well-formed".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::memory_operator;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let op = memory_operator().unwrap();
        let bytes = br#"{"algorithm":"test"}"#;

        let locator = put_envelope(&op, bytes).await.unwrap();
        let fetched = get_envelope(&op, &locator).await.unwrap();
        assert_eq!(fetched, bytes);
    }

    #[tokio::test]
    async fn test_locator_is_content_addressed() {
        let op = memory_operator().unwrap();
        let a = put_envelope(&op, b"same bytes").await.unwrap();
        let b = put_envelope(&op, b"same bytes").await.unwrap();
        assert_eq!(a, b, "identical bytes must map to identical locators");

        let c = put_envelope(&op, b"other bytes").await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_get_unknown_locator() {
        let op = memory_operator().unwrap();
        let locator = Locator::new("ab".repeat(32));
        let result = get_envelope(&op, &locator).await;
        assert!(matches!(result, Err(SealError::Storage(_))));
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_locator() {
        let op = memory_operator().unwrap();
        let locator = Locator::new("../../../etc/passwd");
        let result = get_envelope(&op, &locator).await;
        assert!(matches!(result, Err(SealError::Format(_))));
    }

    #[tokio::test]
    async fn test_put_rejects_empty() {
        let op = memory_operator().unwrap();
        let result = put_envelope(&op, b"").await;
        assert!(matches!(result, Err(SealError::Storage(_))));
    }
}
