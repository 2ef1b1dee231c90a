//! Error types for protocol encoding and decoding.
//!
//! [`ProtocolError`] covers everything that can go wrong between raw wire
//! bytes and a typed request: broken envelopes, unknown message types,
//! payloads that do not match their declared type, and hashing failures.

use thiserror::Error;

/// Errors produced while packing or parsing protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The outer envelope is not valid JSON, a field is missing or not valid
    /// base64, a decoded field has the wrong width, or the payload is not
    /// valid UTF-8.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The inner payload declares a `tipo` this protocol does not know.
    #[error("unsupported message type: {0}")]
    UnsupportedType(String),

    /// The inner payload is not valid JSON, or its `datos` do not match the
    /// declared `tipo`.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Argon2id hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
