use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SealError, SealResult};

/// Absolute recipient cap per envelope. Bounds envelope size and the CPU
/// spent on wrap-key derivations; the parser rejects tables beyond it.
pub const MAX_RECIPIENTS: usize = 10;

/// Top-level sealdrop configuration (loaded from sealdrop.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub crypto: CryptoConfig,
    pub carrier: CarrierConfig,
    pub storage: StorageConfig,
}

/// Envelope encryption knobs.
///
/// Cost factors are recorded in every sealed envelope, so lowering them
/// only affects envelopes sealed afterwards; existing envelopes decrypt
/// with the parameters they were sealed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iteration count for payload-key derivation (default: 100_000)
    pub payload_cost_factor: u32,
    /// PBKDF2 iteration count for per-recipient wrap-key derivation (default: 50_000)
    pub wrap_cost_factor: u32,
    /// Wrap the inner ciphertext in a second, independently-keyed layer (default: true)
    pub double_layer: bool,
    /// Maximum plaintext payload size in bytes (default: 25 MiB)
    pub max_payload_bytes: usize,
    /// Maximum number of recipients per envelope (default: 10)
    pub max_recipients: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            payload_cost_factor: 100_000,
            wrap_cost_factor: 50_000,
            double_layer: true,
            max_payload_bytes: 25 * 1024 * 1024,
            max_recipients: 10,
        }
    }
}

/// Carrier image dimensions. Embed and extract must agree on these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
        }
    }
}

/// Blob-store endpoint configuration (S3-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    /// Enforce HTTPS for the storage endpoint (warn/error on HTTP)
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: "us-east-1".into(),
            bucket: "sealdrop".into(),
            enforce_tls: true,
        }
    }
}

impl VaultConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> SealResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SealError::Config(format!("reading {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| SealError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a usable envelope.
    pub fn validate(&self) -> SealResult<()> {
        if self.crypto.payload_cost_factor == 0 || self.crypto.wrap_cost_factor == 0 {
            return Err(SealError::Config("KDF cost factor must be non-zero".into()));
        }
        if self.crypto.max_recipients == 0 {
            return Err(SealError::Config("max_recipients must be non-zero".into()));
        }
        if self.crypto.max_recipients > MAX_RECIPIENTS {
            return Err(SealError::Config(format!(
                "max_recipients {} exceeds the format cap {MAX_RECIPIENTS}",
                self.crypto.max_recipients
            )));
        }
        if self.crypto.max_payload_bytes == 0 {
            return Err(SealError::Config("max_payload_bytes must be non-zero".into()));
        }
        if self.carrier.width == 0 || self.carrier.height == 0 {
            return Err(SealError::Config("carrier dimensions must be non-zero".into()));
        }
        if self.crypto.payload_cost_factor < 10_000 {
            tracing::warn!(
                cost_factor = self.crypto.payload_cost_factor,
                "payload KDF cost factor is low; brute-forcing identities gets cheaper"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = VaultConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crypto.payload_cost_factor, 100_000);
        assert_eq!(config.crypto.wrap_cost_factor, 50_000);
        assert_eq!(config.crypto.max_recipients, 10);
        assert!(config.crypto.double_layer);
        assert_eq!((config.carrier.width, config.carrier.height), (400, 400));
    }

    #[test]
    fn test_zero_cost_factor_rejected() {
        let mut config = VaultConfig::default();
        config.crypto.wrap_cost_factor = 0;
        assert!(matches!(config.validate(), Err(SealError::Config(_))));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealdrop.toml");
        std::fs::write(
            &path,
            r#"
[crypto]
payload_cost_factor = 20000
double_layer = false

[carrier]
width = 256
height = 256
"#,
        )
        .unwrap();

        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.crypto.payload_cost_factor, 20_000);
        // Unspecified fields keep their defaults
        assert_eq!(config.crypto.wrap_cost_factor, 50_000);
        assert!(!config.crypto.double_layer);
        assert_eq!(config.carrier.width, 256);
    }

    #[test]
    fn test_load_missing_file() {
        let result = VaultConfig::load(Path::new("/nonexistent/sealdrop.toml"));
        assert!(matches!(result, Err(SealError::Config(_))));
    }
}
