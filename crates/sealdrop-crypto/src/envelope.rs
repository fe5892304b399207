//! Envelope building, parsing, and the canonical wire record
//!
//! The wire form is one JSON record with every binary field base64. Parsing
//! is strict and happens entirely before any cryptographic work: required
//! fields present, unknown fields rejected, fixed-size fields exactly
//! sized, algorithm recognized, KDF costs within bounds, recipient count
//! capped. A malformed envelope never reaches a cipher.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use sealdrop_core::config::MAX_RECIPIENTS;
use sealdrop_core::{CryptoConfig, Payload, RecipientIdentity, SealError, SealResult};

use crate::aead::{self, PAYLOAD_CONTEXT, SHELL_CONTEXT};
use crate::kdf::{self, CipherKey, KdfParams, SALT_SIZE};
use crate::wrap::{self, RecipientTable, WrapEntry};
use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Accepted KDF cost-factor range for parsed envelopes. The lower bound
/// keeps a hostile envelope from downgrading derivation work to nothing;
/// the upper bound keeps one from pinning a CPU for minutes.
const COST_FACTOR_RANGE: RangeInclusive<u32> = 1_000..=10_000_000;

/// Closed set of recognized envelope formats. Unknown identifiers are
/// rejected at parse time, not deferred to the cipher call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmId {
    /// PBKDF2-HMAC-SHA512 derivation + XChaCha20-Poly1305 layers, format v1.
    #[serde(rename = "sealdrop.xchacha20poly1305.v1")]
    XChaCha20Poly1305V1,
}

/// The outer defense-in-depth layer: its random key travels inside each
/// recipient's wrap entry, its nonce and tag here.
#[derive(Debug, Clone)]
pub struct ShellLayer {
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
}

/// A parsed, validated envelope. Binary fields are decoded; nothing in
/// here has been decrypted.
#[derive(Debug, Clone)]
pub struct SealedEnvelope {
    pub algorithm: AlgorithmId,
    pub payload_kdf: KdfParams,
    pub wrap_kdf: KdfParams,
    /// Salt for payload-key derivation from the sealer's secret material.
    pub salt: [u8; SALT_SIZE],
    /// Inner-layer nonce.
    pub nonce: [u8; NONCE_SIZE],
    /// Inner-layer authentication tag.
    pub auth_tag: [u8; TAG_SIZE],
    /// Outermost ciphertext (shell output when the shell layer is present,
    /// inner output otherwise).
    pub ciphertext: Vec<u8>,
    pub shell: Option<ShellLayer>,
    pub recipients: RecipientTable,
}

// ── wire records ───────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvelopeRecord {
    algorithm: AlgorithmId,
    payload_kdf: KdfParams,
    wrap_kdf: KdfParams,
    salt: String,
    nonce: String,
    auth_tag: String,
    ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shell_nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shell_tag: Option<String>,
    recipients: BTreeMap<String, WrapEntryRecord>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WrapEntryRecord {
    wrap_salt: String,
    wrap_nonce: String,
    wrap_tag: String,
    wrapped_key: String,
}

/// Payload wire form carried inside the inner ciphertext.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PayloadRecord {
    name: String,
    content_type: String,
    note: String,
    created_at_ms: u64,
    data: String,
}

// ── build / open ───────────────────────────────────────────────────────────

/// Seal a payload into an envelope.
///
/// The payload key is derived from the sealer's secret material and a
/// fresh salt; recipients recover the same key from their wrap entry, so
/// unsealing never needs the secret material.
pub fn build_envelope(
    payload: &Payload,
    recipients: &[RecipientIdentity],
    secret: &SecretString,
    config: &CryptoConfig,
) -> SealResult<SealedEnvelope> {
    if payload.data.len() > config.max_payload_bytes {
        return Err(SealError::Config(format!(
            "payload size {} exceeds maximum {}",
            payload.data.len(),
            config.max_payload_bytes
        )));
    }

    let payload_kdf = KdfParams::new(config.payload_cost_factor);
    let wrap_kdf = KdfParams::new(config.wrap_cost_factor);

    let salt = kdf::generate_salt();
    let payload_key = kdf::derive_key(secret.expose_secret().as_bytes(), &salt, &payload_kdf)?;

    let plaintext = Zeroizing::new(encode_payload(payload)?);
    let inner = aead::seal(&payload_key, PAYLOAD_CONTEXT, &plaintext)?;

    // Key material each recipient recovers: payload key, plus the shell
    // key when the shell layer is present.
    let mut key_material = Zeroizing::new(payload_key.as_bytes().to_vec());

    let (ciphertext, shell) = if config.double_layer {
        let shell_key = kdf::generate_key();
        let outer = aead::seal(&shell_key, SHELL_CONTEXT, &inner.ciphertext)?;
        key_material.extend_from_slice(shell_key.as_bytes());
        (
            outer.ciphertext,
            Some(ShellLayer {
                nonce: outer.nonce,
                tag: outer.tag,
            }),
        )
    } else {
        (inner.ciphertext, None)
    };

    let table = wrap::wrap_for(&key_material, recipients, &wrap_kdf, config.max_recipients)?;

    tracing::debug!(
        recipients = table.len(),
        double_layer = shell.is_some(),
        payload_bytes = payload.data.len(),
        "sealed envelope"
    );

    Ok(SealedEnvelope {
        algorithm: AlgorithmId::XChaCha20Poly1305V1,
        payload_kdf,
        wrap_kdf,
        salt,
        nonce: inner.nonce,
        auth_tag: inner.tag,
        ciphertext,
        shell,
        recipients: table,
    })
}

/// Open an envelope as `identity`.
///
/// Recovers the key material via the recipient table, peels the shell
/// layer if present, then the inner layer, and decodes the payload.
/// Intermediate key material is zeroized before returning.
pub fn open_envelope(
    envelope: &SealedEnvelope,
    identity: &RecipientIdentity,
) -> SealResult<Payload> {
    let key_material = wrap::unwrap_for(&envelope.recipients, identity, &envelope.wrap_kdf)?;

    let expected = if envelope.shell.is_some() {
        2 * KEY_SIZE
    } else {
        KEY_SIZE
    };
    if key_material.len() != expected {
        tracing::debug!(
            len = key_material.len(),
            expected,
            "unwrapped key material has unexpected length"
        );
        return Err(SealError::Auth);
    }

    let mut payload_key_bytes = [0u8; KEY_SIZE];
    payload_key_bytes.copy_from_slice(&key_material[..KEY_SIZE]);
    let payload_key = CipherKey::from_bytes(payload_key_bytes);

    let inner_ciphertext = match &envelope.shell {
        Some(shell) => {
            let mut shell_key_bytes = [0u8; KEY_SIZE];
            shell_key_bytes.copy_from_slice(&key_material[KEY_SIZE..]);
            let shell_key = CipherKey::from_bytes(shell_key_bytes);
            Zeroizing::new(aead::open(
                &shell_key,
                &shell.nonce,
                SHELL_CONTEXT,
                &envelope.ciphertext,
                &shell.tag,
            )?)
        }
        None => Zeroizing::new(envelope.ciphertext.clone()),
    };

    let plaintext = Zeroizing::new(aead::open(
        &payload_key,
        &envelope.nonce,
        PAYLOAD_CONTEXT,
        &inner_ciphertext,
        &envelope.auth_tag,
    )?);

    decode_payload(&plaintext)
}

// ── serialization ──────────────────────────────────────────────────────────

impl SealedEnvelope {
    /// Serialize to the canonical JSON wire record.
    pub fn to_bytes(&self) -> SealResult<Vec<u8>> {
        let recipients = self
            .recipients
            .iter()
            .map(|(identity, entry)| {
                (
                    identity.as_str().to_string(),
                    WrapEntryRecord {
                        wrap_salt: BASE64.encode(entry.wrap_salt),
                        wrap_nonce: BASE64.encode(entry.wrap_nonce),
                        wrap_tag: BASE64.encode(entry.wrap_tag),
                        wrapped_key: BASE64.encode(&entry.wrapped_key),
                    },
                )
            })
            .collect();

        let record = EnvelopeRecord {
            algorithm: self.algorithm,
            payload_kdf: self.payload_kdf,
            wrap_kdf: self.wrap_kdf,
            salt: BASE64.encode(self.salt),
            nonce: BASE64.encode(self.nonce),
            auth_tag: BASE64.encode(self.auth_tag),
            ciphertext: BASE64.encode(&self.ciphertext),
            shell_nonce: self.shell.as_ref().map(|s| BASE64.encode(s.nonce)),
            shell_tag: self.shell.as_ref().map(|s| BASE64.encode(s.tag)),
            recipients,
        };

        serde_json::to_vec(&record)
            .map_err(|e| SealError::Format(format!("envelope serialization: {e}")))
    }

    /// Strict parse: full schema and range validation before any
    /// cryptographic operation.
    pub fn parse(bytes: &[u8]) -> SealResult<Self> {
        let record: EnvelopeRecord = serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!(error = %e, "envelope record rejected");
            SealError::Format("envelope is not a valid record".into())
        })?;

        validate_kdf_params(&record.payload_kdf, "payload_kdf")?;
        validate_kdf_params(&record.wrap_kdf, "wrap_kdf")?;

        let salt = decode_array::<SALT_SIZE>(&record.salt, "salt")?;
        let nonce = decode_array::<NONCE_SIZE>(&record.nonce, "nonce")?;
        let auth_tag = decode_array::<TAG_SIZE>(&record.auth_tag, "auth_tag")?;
        let ciphertext = decode_field(&record.ciphertext, "ciphertext")?;
        if ciphertext.is_empty() {
            return Err(SealError::Format("ciphertext is empty".into()));
        }

        let shell = match (record.shell_nonce, record.shell_tag) {
            (Some(n), Some(t)) => Some(ShellLayer {
                nonce: decode_array::<NONCE_SIZE>(&n, "shell_nonce")?,
                tag: decode_array::<TAG_SIZE>(&t, "shell_tag")?,
            }),
            (None, None) => None,
            _ => {
                return Err(SealError::Format(
                    "shell layer fields must be present together".into(),
                ))
            }
        };

        if record.recipients.is_empty() {
            return Err(SealError::Format("recipient table is empty".into()));
        }
        if record.recipients.len() > MAX_RECIPIENTS {
            return Err(SealError::Format(format!(
                "recipient table size {} exceeds cap {MAX_RECIPIENTS}",
                record.recipients.len()
            )));
        }

        // A shell-bearing envelope wraps payload key + shell key; without
        // the shell it is the payload key alone. Checked here so a
        // mis-sized entry fails before any derivation.
        let expected_wrapped = if shell.is_some() {
            2 * KEY_SIZE
        } else {
            KEY_SIZE
        };

        let mut recipients = RecipientTable::new();
        for (raw_identity, entry) in &record.recipients {
            let identity = RecipientIdentity::new(raw_identity)
                .map_err(|_| SealError::Format("invalid recipient identity".into()))?;
            let wrapped_key = decode_field(&entry.wrapped_key, "wrapped_key")?;
            if wrapped_key.len() != expected_wrapped {
                return Err(SealError::Format(format!(
                    "wrapped key has size {} (expected {expected_wrapped})",
                    wrapped_key.len()
                )));
            }
            let decoded = WrapEntry {
                wrap_salt: decode_array::<SALT_SIZE>(&entry.wrap_salt, "wrap_salt")?,
                wrap_nonce: decode_array::<NONCE_SIZE>(&entry.wrap_nonce, "wrap_nonce")?,
                wrap_tag: decode_array::<TAG_SIZE>(&entry.wrap_tag, "wrap_tag")?,
                wrapped_key,
            };
            if recipients.insert(identity, decoded).is_some() {
                return Err(SealError::Format(
                    "duplicate recipient after normalization".into(),
                ));
            }
        }

        Ok(Self {
            algorithm: record.algorithm,
            payload_kdf: record.payload_kdf,
            wrap_kdf: record.wrap_kdf,
            salt,
            nonce,
            auth_tag,
            ciphertext,
            shell,
            recipients,
        })
    }
}

fn validate_kdf_params(params: &KdfParams, field: &str) -> SealResult<()> {
    if !COST_FACTOR_RANGE.contains(&params.cost_factor) {
        return Err(SealError::Format(format!(
            "{field}: cost factor {} out of accepted range",
            params.cost_factor
        )));
    }
    if params.output_length as usize != KEY_SIZE {
        return Err(SealError::Format(format!(
            "{field}: unsupported output length {}",
            params.output_length
        )));
    }
    Ok(())
}

fn decode_field(value: &str, field: &str) -> SealResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|_| SealError::Format(format!("{field}: invalid base64")))
}

fn decode_array<const N: usize>(value: &str, field: &str) -> SealResult<[u8; N]> {
    let bytes = decode_field(value, field)?;
    let array: [u8; N] = bytes
        .try_into()
        .map_err(|_| SealError::Format(format!("{field}: wrong size (expected {N} bytes)")))?;
    Ok(array)
}

fn encode_payload(payload: &Payload) -> SealResult<Vec<u8>> {
    let record = PayloadRecord {
        name: payload.name.clone(),
        content_type: payload.content_type.clone(),
        note: payload.note.clone(),
        created_at_ms: payload.created_at_ms,
        data: BASE64.encode(&payload.data),
    };
    serde_json::to_vec(&record)
        .map_err(|e| SealError::Format(format!("payload serialization: {e}")))
}

fn decode_payload(plaintext: &[u8]) -> SealResult<Payload> {
    let record: PayloadRecord = serde_json::from_slice(plaintext)
        .map_err(|_| SealError::Format("payload record is malformed".into()))?;
    let data = BASE64
        .decode(&record.data)
        .map_err(|_| SealError::Format("payload data: invalid base64".into()))?;
    Ok(Payload {
        name: record.name,
        content_type: record.content_type,
        note: record.note,
        created_at_ms: record.created_at_ms,
        data,
    })
}
