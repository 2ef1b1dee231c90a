//! Server-side validation pipeline: parse, authenticate, admit, decode.
//!
//! Order matters. The MAC is checked before the nonce is admitted so that an
//! unauthenticated sender cannot burn a chosen nonce, and the nonce is
//! admitted before the payload is decoded so a replayed valid envelope is
//! rejected exactly once per nonce value.

use bancx::constants::NONCE_TTL_SECS;
use bancx::{decode_payload, envelope, mac, ProtocolError, Request};

use crate::db::Store;

/// Why a request was rejected before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MalformedEnvelope,
    Integrity,
    Replay,
    UnsupportedType,
    MalformedPayload,
}

impl Rejection {
    /// Stable user-visible message for this rejection.
    pub fn mensaje(self) -> &'static str {
        match self {
            Rejection::MalformedEnvelope | Rejection::MalformedPayload => "Mensaje malformado",
            Rejection::Integrity => "MAC inválido - Integridad comprometida",
            Rejection::Replay => "NONCE ya usado - Replay attack detectado",
            Rejection::UnsupportedType => "Tipo de mensaje no soportado",
        }
    }
}

/// Run the full admission pipeline over raw bytes from the wire.
pub fn validate(key: &[u8], store: &Store, raw: &[u8]) -> Result<Request, Rejection> {
    let unpacked = envelope::unpack(raw).map_err(|e| {
        tracing::info!(error = %e, "sobre malformado");
        Rejection::MalformedEnvelope
    })?;

    if !mac::verify_mac(key, &unpacked.payload, &unpacked.nonce, &unpacked.mac) {
        tracing::warn!("MAC inválido: integridad comprometida");
        return Err(Rejection::Integrity);
    }

    match store.admit_nonce(&unpacked.nonce, NONCE_TTL_SECS) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("nonce repetido: replay detectado");
            return Err(Rejection::Replay);
        }
        Err(e) => {
            // fail secure: a nonce we cannot admit is treated as spent
            tracing::error!(error = %e, "fallo al admitir el nonce");
            return Err(Rejection::Replay);
        }
    }

    decode_payload(&unpacked.payload).map_err(|e| match e {
        ProtocolError::UnsupportedType(tipo) => {
            tracing::warn!(tipo = tipo.as_str(), "tipo de mensaje no soportado");
            Rejection::UnsupportedType
        }
        other => {
            tracing::info!(error = %other, "payload malformado");
            Rejection::MalformedPayload
        }
    })
}
