//! Multi-recipient key wrap: one shared secret, one entry per recipient
//!
//! Each recipient gets an independent wrap of the same key material: a wrap
//! key derived from their identity plus a fixed context suffix and a fresh
//! per-recipient salt, then an AEAD seal under a fresh nonce. Any single
//! entry unlocks the envelope; no entry reveals anything about the others.

use std::collections::{BTreeMap, BTreeSet};

use zeroize::Zeroizing;

use sealdrop_core::{RecipientIdentity, SealError, SealResult};

use crate::aead::{self, KEY_WRAP_CONTEXT};
use crate::kdf::{self, CipherKey, KdfParams, SALT_SIZE};
use crate::{NONCE_SIZE, TAG_SIZE};

/// Context suffix appended to the identity before wrap-key derivation, so
/// an identity-derived wrap key can never collide with a key derived from
/// the same string for another purpose.
const WRAP_KDF_SUFFIX: &[u8] = b"/sealdrop/wrap/v1";

/// One recipient's wrap entry (decoded form).
#[derive(Debug, Clone)]
pub struct WrapEntry {
    pub wrap_salt: [u8; SALT_SIZE],
    pub wrap_nonce: [u8; NONCE_SIZE],
    pub wrap_tag: [u8; TAG_SIZE],
    pub wrapped_key: Vec<u8>,
}

/// Identity → wrap entry. BTreeMap keeps serialization order canonical.
pub type RecipientTable = BTreeMap<RecipientIdentity, WrapEntry>;

/// Wrap `key_material` once per recipient.
///
/// Duplicate identities (after normalization) collapse to a single entry.
/// `max_recipients` is the configured cap; exceeding it is a caller error.
pub fn wrap_for(
    key_material: &[u8],
    recipients: &[RecipientIdentity],
    params: &KdfParams,
    max_recipients: usize,
) -> SealResult<RecipientTable> {
    if recipients.is_empty() {
        return Err(SealError::Config("at least one recipient is required".into()));
    }
    let unique: BTreeSet<&RecipientIdentity> = recipients.iter().collect();
    if unique.len() > max_recipients {
        return Err(SealError::Config(format!(
            "recipient count {} exceeds maximum {max_recipients}",
            unique.len()
        )));
    }

    let mut table = RecipientTable::new();
    for identity in unique {
        let wrap_salt = kdf::generate_salt();
        let wrap_key = derive_wrap_key(identity, &wrap_salt, params)?;
        let sealed = aead::seal(&wrap_key, KEY_WRAP_CONTEXT, key_material)?;
        table.insert(
            identity.clone(),
            WrapEntry {
                wrap_salt,
                wrap_nonce: sealed.nonce,
                wrap_tag: sealed.tag,
                wrapped_key: sealed.ciphertext,
            },
        );
    }
    Ok(table)
}

/// Recover the shared key material as `identity`.
///
/// Absent identity and failed open are indistinguishable: both return
/// [`SealError::NotAuthorized`], and the absent path still burns one KDF
/// derivation so timing does not reveal table membership.
pub fn unwrap_for(
    table: &RecipientTable,
    identity: &RecipientIdentity,
    params: &KdfParams,
) -> SealResult<Zeroizing<Vec<u8>>> {
    let Some(entry) = table.get(identity) else {
        let decoy_salt = kdf::generate_salt();
        let _ = derive_wrap_key(identity, &decoy_salt, params)?;
        tracing::debug!(identity = %identity, "identity not present in recipient table");
        return Err(SealError::NotAuthorized);
    };

    let wrap_key = derive_wrap_key(identity, &entry.wrap_salt, params)?;
    match aead::open(
        &wrap_key,
        &entry.wrap_nonce,
        KEY_WRAP_CONTEXT,
        &entry.wrapped_key,
        &entry.wrap_tag,
    ) {
        Ok(key_material) => Ok(Zeroizing::new(key_material)),
        Err(_) => {
            tracing::debug!(identity = %identity, "wrap entry failed to open");
            Err(SealError::NotAuthorized)
        }
    }
}

fn derive_wrap_key(
    identity: &RecipientIdentity,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> SealResult<CipherKey> {
    let mut input = Vec::with_capacity(identity.as_str().len() + WRAP_KDF_SUFFIX.len());
    input.extend_from_slice(identity.as_str().as_bytes());
    input.extend_from_slice(WRAP_KDF_SUFFIX);
    kdf::derive_key(&input, salt, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> KdfParams {
        KdfParams::new(1_000)
    }

    fn identity(raw: &str) -> RecipientIdentity {
        RecipientIdentity::new(raw).unwrap()
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let material = [0x5Au8; 64];
        let recipients = [identity("0xAAA111"), identity("0xBBB222")];
        let table = wrap_for(&material, &recipients, &test_params(), 10).unwrap();
        assert_eq!(table.len(), 2);

        for r in &recipients {
            let recovered = unwrap_for(&table, r, &test_params()).unwrap();
            assert_eq!(recovered.as_slice(), &material);
        }
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let material = [1u8; 32];
        let table = wrap_for(&material, &[identity("0xAbCdEf")], &test_params(), 10).unwrap();
        let recovered = unwrap_for(&table, &identity("0xABCDEF"), &test_params()).unwrap();
        assert_eq!(recovered.as_slice(), &material);
    }

    #[test]
    fn test_unknown_identity_not_authorized() {
        let table = wrap_for(&[1u8; 32], &[identity("0xAAA")], &test_params(), 10).unwrap();
        let result = unwrap_for(&table, &identity("0xCCC"), &test_params());
        assert!(matches!(result, Err(SealError::NotAuthorized)));
    }

    #[test]
    fn test_cross_recipient_isolation() {
        // A's identity must not open B's entry even when grafted in place
        let material = [9u8; 32];
        let table = wrap_for(
            &material,
            &[identity("0xAAA"), identity("0xBBB")],
            &test_params(),
            10,
        )
        .unwrap();

        let mut forged = RecipientTable::new();
        forged.insert(identity("0xAAA"), table[&identity("0xBBB")].clone());
        let result = unwrap_for(&forged, &identity("0xAAA"), &test_params());
        assert!(matches!(result, Err(SealError::NotAuthorized)));
    }

    #[test]
    fn test_tampered_wrapped_key() {
        let table = wrap_for(&[3u8; 32], &[identity("0xAAA")], &test_params(), 10).unwrap();
        let mut tampered = table.clone();
        tampered.get_mut(&identity("0xAAA")).unwrap().wrapped_key[0] ^= 0x01;
        let result = unwrap_for(&tampered, &identity("0xAAA"), &test_params());
        assert!(matches!(result, Err(SealError::NotAuthorized)));
    }

    #[test]
    fn test_duplicates_collapse() {
        let recipients = [identity("0xAAA"), identity("0xaaa"), identity(" 0xAaA ")];
        let table = wrap_for(&[1u8; 32], &recipients, &test_params(), 10).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_recipient_cap_enforced() {
        let recipients: Vec<_> = (0..11).map(|i| identity(&format!("0x{i:03}"))).collect();
        let result = wrap_for(&[1u8; 32], &recipients, &test_params(), 10);
        assert!(matches!(result, Err(SealError::Config(_))));
    }

    #[test]
    fn test_empty_recipients_rejected() {
        let result = wrap_for(&[1u8; 32], &[], &test_params(), 10);
        assert!(matches!(result, Err(SealError::Config(_))));
    }

    #[test]
    fn test_wrap_keys_independent_per_recipient() {
        // Same material, but every entry is sealed under a different salt
        // and nonce, so the wrapped bytes must differ
        let table = wrap_for(
            &[7u8; 32],
            &[identity("0xAAA"), identity("0xBBB")],
            &test_params(),
            10,
        )
        .unwrap();
        let a = &table[&identity("0xAAA")];
        let b = &table[&identity("0xBBB")];
        assert_ne!(a.wrap_salt, b.wrap_salt);
        assert_ne!(a.wrap_nonce, b.wrap_nonce);
        assert_ne!(a.wrapped_key, b.wrapped_key);
    }
}
