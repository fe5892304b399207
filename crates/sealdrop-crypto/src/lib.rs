//! sealdrop-crypto: envelope encryption for identity-bound recipients
//!
//! Layering (format v1, `sealdrop.xchacha20poly1305.v1`):
//! ```text
//! payload JSON
//!   └── inner layer:  XChaCha20-Poly1305, key = PBKDF2-SHA512(secret, salt),
//!                     AAD = payload context
//!       └── shell layer: XChaCha20-Poly1305, key = fresh random,
//!                        AAD = shell context (default on)
//!
//! payload key [ || shell key ]
//!   └── wrapped once per recipient: XChaCha20-Poly1305,
//!       key = PBKDF2-SHA512(identity + wrap context, per-recipient salt)
//! ```
//!
//! Every layer uses a fresh random nonce and a distinct AAD context string,
//! so no layer's ciphertext can be replayed as another's.

pub mod aead;
pub mod envelope;
pub mod kdf;
pub mod wrap;

pub use envelope::{build_envelope, open_envelope, AlgorithmId, SealedEnvelope, ShellLayer};
pub use kdf::{derive_key, generate_key, CipherKey, KdfParams};
pub use wrap::{unwrap_for, wrap_for, RecipientTable, WrapEntry};

use secrecy::SecretString;

use sealdrop_core::{CryptoConfig, Payload, RecipientIdentity, SealResult};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Seal a payload for a set of recipients.
///
/// Returns the canonical envelope record as JSON bytes. Any recipient in
/// `recipients` (and only they) can later recover the payload with
/// [`unseal`].
pub fn seal(
    payload: &Payload,
    recipients: &[RecipientIdentity],
    secret: &SecretString,
    config: &CryptoConfig,
) -> SealResult<Vec<u8>> {
    let envelope = build_envelope(payload, recipients, secret, config)?;
    envelope.to_bytes()
}

/// Parse and open envelope bytes as the given recipient.
///
/// Identity-gated: callers are expected to have authenticated the identity
/// first (see the vault crate). Decrypted key material is zeroized before
/// this returns.
pub fn unseal(bytes: &[u8], identity: &RecipientIdentity) -> SealResult<Payload> {
    let envelope = SealedEnvelope::parse(bytes)?;
    open_envelope(&envelope, identity)
}
