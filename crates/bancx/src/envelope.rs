//! The authenticated envelope: payload, MAC and nonce packed as one JSON
//! document per connection.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::constants::{MAC_SIZE, NONCE_SIZE};
use crate::error::ProtocolError;
use crate::message::Request;
use crate::{mac, nonce};

/// Wire form of the envelope. All three fields are base64 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub mensaje: String,
    pub mac: String,
    pub nonce: String,
}

/// A parsed envelope: raw payload bytes plus fixed-width MAC and nonce.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    pub payload: Vec<u8>,
    pub mac: [u8; MAC_SIZE],
    pub nonce: [u8; NONCE_SIZE],
}

/// Serialize a typed request, draw a fresh nonce, authenticate, and emit the
/// outer JSON document ready for the wire.
pub fn pack(key: &[u8], request: &Request) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(request)?;
    let nonce = nonce::make_nonce();
    let tag = mac::compute_mac(key, &payload, &nonce);
    let envelope = Envelope {
        mensaje: BASE64.encode(&payload),
        mac: BASE64.encode(tag),
        nonce: BASE64.encode(nonce),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Parse an outer envelope received from the wire.
///
/// Rejects invalid JSON, missing fields, non-base64 content, a MAC or nonce
/// that is not exactly 32 bytes after decoding, and payloads that are not
/// valid UTF-8.
pub fn unpack(raw: &[u8]) -> Result<Unpacked, ProtocolError> {
    let envelope: Envelope = serde_json::from_slice(raw)
        .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))?;

    let payload = BASE64
        .decode(&envelope.mensaje)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("mensaje: {e}")))?;
    let mac_bytes = BASE64
        .decode(&envelope.mac)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("mac: {e}")))?;
    let nonce_bytes = BASE64
        .decode(&envelope.nonce)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("nonce: {e}")))?;

    let mac: [u8; MAC_SIZE] = mac_bytes
        .try_into()
        .map_err(|_| ProtocolError::MalformedEnvelope("mac must decode to 32 bytes".into()))?;
    let nonce: [u8; NONCE_SIZE] = nonce_bytes
        .try_into()
        .map_err(|_| ProtocolError::MalformedEnvelope("nonce must decode to 32 bytes".into()))?;

    std::str::from_utf8(&payload)
        .map_err(|_| ProtocolError::MalformedEnvelope("payload is not valid UTF-8".into()))?;

    Ok(Unpacked { payload, mac, nonce })
}
