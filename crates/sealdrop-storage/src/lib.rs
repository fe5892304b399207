//! sealdrop-storage: blob-store collaborator
//!
//! Envelope bytes go in, an opaque locator comes out; the locator is what
//! gets hidden in the carrier image. Storage is content-addressed (BLAKE3
//! of the envelope bytes), so identical envelopes collapse to one object
//! and a fetched envelope can be verified against its own locator.
//!
//! Transient-failure policy (retry, backoff) lives in the operator's retry
//! layer, not in the crypto core.

pub mod blob;
pub mod operator;

pub use blob::{get_envelope, put_envelope};
pub use operator::{build_operator, memory_operator};
