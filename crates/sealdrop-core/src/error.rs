use thiserror::Error;

pub type SealResult<T> = Result<T, SealError>;

/// The sealdrop error taxonomy.
///
/// `Auth` and `NotAuthorized` deliberately carry no detail: the message a
/// caller sees is the same whether a tag failed to verify, an identity was
/// absent from the recipient table, or a signature check failed. Full
/// detail is emitted to `tracing` at the failure site instead.
#[derive(Debug, Error)]
pub enum SealError {
    /// Malformed envelope or carrier, rejected before any cryptographic work.
    #[error("malformed input: {0}")]
    Format(String),

    /// Authentication-tag mismatch somewhere in the layer stack.
    #[error("decryption failed")]
    Auth,

    /// Unknown identity or failed proof of identity.
    #[error("not authorized")]
    NotAuthorized,

    /// Carrier too small for the requested payload.
    #[error("carrier capacity exceeded: need {needed} bits, have {available}")]
    Capacity { needed: usize, available: usize },

    /// Missing or invalid parameter. Fatal, not retryable.
    #[error("config error: {0}")]
    Config(String),

    /// Blob-store collaborator failure.
    #[error("storage error: {0}")]
    Storage(String),
}
