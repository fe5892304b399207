//! sealdrop-core: shared types, configuration schema, and error taxonomy
//!
//! Everything here is consumed by the crypto, stego, storage, and vault
//! crates; this crate has no cryptographic dependencies of its own.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CarrierConfig, CryptoConfig, StorageConfig, VaultConfig};
pub use error::{SealError, SealResult};
pub use types::{Locator, Payload, RecipientIdentity};
