//! OpenDAL Operator factories for sealdrop storage backends

use opendal::Operator;

use sealdrop_core::{SealError, SealResult, StorageConfig};

/// Build an OpenDAL Operator for an S3-compatible endpoint.
///
/// Uses path-style addressing (the opendal default), which self-hosted
/// S3 implementations generally require.
pub fn build_operator(
    config: &StorageConfig,
    access_key_id: &str,
    secret_access_key: &str,
) -> SealResult<Operator> {
    if config.endpoint.starts_with("http://") {
        if config.enforce_tls {
            return Err(SealError::Config(format!(
                "storage endpoint {} uses plaintext HTTP but enforce_tls is enabled; \
                 use an HTTPS endpoint or set storage.enforce_tls = false for local development",
                config.endpoint
            )));
        }
        tracing::warn!(
            endpoint = %config.endpoint,
            "storage endpoint uses plaintext HTTP; credentials are transmitted unencrypted"
        );
    }

    let builder = opendal::services::S3::default()
        .endpoint(&config.endpoint)
        .region(&config.region)
        .bucket(&config.bucket)
        .access_key_id(access_key_id)
        .secret_access_key(secret_access_key);

    let op = Operator::new(builder)
        .map_err(|e| SealError::Storage(format!("creating S3 operator: {e}")))?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(op)
}

/// In-memory operator for tests and local experiments.
pub fn memory_operator() -> SealResult<Operator> {
    let op = Operator::new(opendal::services::Memory::default())
        .map_err(|e| SealError::Storage(format!("creating memory operator: {e}")))?
        .finish();
    Ok(op)
}
