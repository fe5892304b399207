//! sealdrop-vault: the deposit/retrieve lifecycle facade
//!
//! A [`Vault`] owns its collaborators (blob-store operator, signature
//! authenticator, configuration); nothing is ambient or global. Every
//! retrieve builds fresh state from stored bytes, and decrypted material
//! is never cached across calls.

use opendal::Operator;
use secrecy::SecretString;

use sealdrop_core::{Locator, Payload, RecipientIdentity, SealError, SealResult, VaultConfig};

/// Proof-of-identity collaborator.
///
/// Implementations typically recover a signer from a detached signature
/// over `message` and compare it to the claimed identity; the recovery
/// mechanics stay outside this crate.
pub trait SignatureAuthenticator {
    fn verify(&self, message: &[u8], signature: &[u8], identity: &RecipientIdentity) -> bool;
}

/// Result of a deposit: where the envelope lives, and the carrier image
/// with that locator hidden inside it.
#[derive(Debug, Clone)]
pub struct DepositReceipt {
    pub locator: Locator,
    pub carrier_png: Vec<u8>,
}

pub struct Vault<A> {
    op: Operator,
    authenticator: A,
    config: VaultConfig,
}

impl<A: SignatureAuthenticator> Vault<A> {
    pub fn new(op: Operator, authenticator: A, config: VaultConfig) -> SealResult<Self> {
        config.validate()?;
        Ok(Self {
            op,
            authenticator,
            config,
        })
    }

    /// Seal a payload for `recipients`, store the envelope, and hide its
    /// locator in the carrier image.
    pub async fn deposit(
        &self,
        carrier_png: &[u8],
        payload: &Payload,
        recipients: &[RecipientIdentity],
        secret: &SecretString,
    ) -> SealResult<DepositReceipt> {
        let mut carrier = sealdrop_stego::load_carrier(carrier_png)?;
        sealdrop_stego::ensure_dimensions(
            &carrier,
            self.config.carrier.width,
            self.config.carrier.height,
        )?;

        let envelope_bytes =
            sealdrop_crypto::seal(payload, recipients, secret, &self.config.crypto)?;
        let locator = sealdrop_storage::put_envelope(&self.op, &envelope_bytes).await?;

        sealdrop_stego::embed(&mut carrier, locator.as_bytes())?;
        let carrier_png = sealdrop_stego::save_carrier(&carrier)?;

        tracing::info!(
            locator = %locator,
            recipients = recipients.len(),
            "deposited sealed payload"
        );
        Ok(DepositReceipt {
            locator,
            carrier_png,
        })
    }

    /// Recover a payload from a carrier image as `identity`.
    ///
    /// The signature is verified before the carrier is read, the envelope
    /// fetched, or any key material touched; on failure the caller learns
    /// only [`SealError::NotAuthorized`].
    pub async fn retrieve(
        &self,
        carrier_png: &[u8],
        identity: &RecipientIdentity,
        message: &[u8],
        signature: &[u8],
    ) -> SealResult<Payload> {
        self.authenticate(message, signature, identity)?;

        let carrier = sealdrop_stego::load_carrier(carrier_png)?;
        sealdrop_stego::ensure_dimensions(
            &carrier,
            self.config.carrier.width,
            self.config.carrier.height,
        )?;
        let locator = Locator::from_utf8(sealdrop_stego::extract(&carrier)?)?;

        self.fetch_and_unseal(&locator, identity).await
    }

    /// Recover a payload when the locator is already known.
    pub async fn retrieve_by_locator(
        &self,
        locator: &Locator,
        identity: &RecipientIdentity,
        message: &[u8],
        signature: &[u8],
    ) -> SealResult<Payload> {
        self.authenticate(message, signature, identity)?;
        self.fetch_and_unseal(locator, identity).await
    }

    fn authenticate(
        &self,
        message: &[u8],
        signature: &[u8],
        identity: &RecipientIdentity,
    ) -> SealResult<()> {
        if !self.authenticator.verify(message, signature, identity) {
            tracing::debug!(identity = %identity, "signature verification failed");
            return Err(SealError::NotAuthorized);
        }
        Ok(())
    }

    async fn fetch_and_unseal(
        &self,
        locator: &Locator,
        identity: &RecipientIdentity,
    ) -> SealResult<Payload> {
        let envelope_bytes = sealdrop_storage::get_envelope(&self.op, locator).await?;
        sealdrop_crypto::unseal(&envelope_bytes, identity)
    }
}
