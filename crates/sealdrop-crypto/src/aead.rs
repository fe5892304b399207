//! Authenticated encryption: XChaCha20-Poly1305 with per-layer context binding
//!
//! Every seal generates a fresh random 192-bit nonce; callers never supply
//! one. The AAD is a fixed context string naming the layer, so ciphertext
//! produced for one layer cannot be replayed into another.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload as AeadPayload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use sealdrop_core::{SealError, SealResult};

use crate::kdf::CipherKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// AAD context for the inner payload layer.
pub const PAYLOAD_CONTEXT: &[u8] = b"sealdrop/payload/v1";

/// AAD context for the outer shell layer.
pub const SHELL_CONTEXT: &[u8] = b"sealdrop/shell/v1";

/// AAD context for per-recipient key wrapping.
pub const KEY_WRAP_CONTEXT: &[u8] = b"sealdrop/keywrap/v1";

/// One sealed buffer: ciphertext plus the nonce and tag needed to open it.
pub struct SealedChunk {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

/// Seal `plaintext` under `key`, bound to the given layer context.
pub fn seal(key: &CipherKey, context: &[u8], plaintext: &[u8]) -> SealResult<SealedChunk> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let mut combined = cipher
        .encrypt(
            nonce,
            AeadPayload {
                msg: plaintext,
                aad: context,
            },
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "AEAD seal failed");
            SealError::Config("plaintext too large to seal".into())
        })?;

    // encrypt() returns ciphertext with the tag appended; the envelope
    // stores them as separate fields
    let tag_start = combined.len() - TAG_SIZE;
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&combined[tag_start..]);
    combined.truncate(tag_start);

    Ok(SealedChunk {
        nonce: nonce_bytes,
        ciphertext: combined,
        tag,
    })
}

/// Open a sealed buffer. Fails closed: any tag mismatch, wrong key, wrong
/// nonce, or wrong context yields the generic [`SealError::Auth`] and no
/// plaintext.
pub fn open(
    key: &CipherKey,
    nonce: &[u8; NONCE_SIZE],
    context: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> SealResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            AeadPayload {
                msg: &combined,
                aad: context,
            },
        )
        .map_err(|_| {
            tracing::debug!("AEAD open failed: tag mismatch or corrupted input");
            SealError::Auth
        })
}
