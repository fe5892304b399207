//! Key derivation: PBKDF2-HMAC-SHA512 secret/identity → symmetric key

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::Zeroize;

use sealdrop_core::{SealError, SealResult};

use crate::KEY_SIZE;

/// Minimum accepted salt length in bytes.
pub const MIN_SALT_SIZE: usize = 16;

/// Salt length produced by [`generate_salt`] and required by format v1.
pub const SALT_SIZE: usize = 32;

/// PBKDF2 parameters for one derivation purpose.
///
/// Stored in the envelope so decryption reproduces byte-identical keys.
/// The cost factor differs by purpose: payload-key derivation runs more
/// iterations than per-recipient wrap-key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KdfParams {
    /// PBKDF2 iteration count
    pub cost_factor: u32,
    /// Derived key length in bytes
    pub output_length: u32,
}

impl KdfParams {
    pub fn new(cost_factor: u32) -> Self {
        Self {
            cost_factor,
            output_length: KEY_SIZE as u32,
        }
    }
}

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone)]
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random 256-bit key.
pub fn generate_key() -> CipherKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    CipherKey::from_bytes(bytes)
}

/// Generate a fresh random salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from low-entropy secret material.
///
/// Deliberately slow and tunable via `params.cost_factor` so each guess at
/// the secret costs real CPU time. Deterministic: identical
/// `(secret, salt, params)` always yields byte-identical output.
pub fn derive_key(secret: &[u8], salt: &[u8], params: &KdfParams) -> SealResult<CipherKey> {
    // A short salt is a bug in the caller, not a runtime condition.
    assert!(
        salt.len() >= MIN_SALT_SIZE,
        "KDF salt must be at least {MIN_SALT_SIZE} bytes, got {}",
        salt.len()
    );
    if params.cost_factor == 0 {
        return Err(SealError::Config("KDF cost factor must be non-zero".into()));
    }
    if params.output_length as usize != KEY_SIZE {
        return Err(SealError::Config(format!(
            "unsupported KDF output length {} (expected {KEY_SIZE})",
            params.output_length
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(secret, salt, params.cost_factor, &mut key);
    Ok(CipherKey::from_bytes(key))
}
