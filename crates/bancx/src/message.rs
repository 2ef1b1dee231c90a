//! Typed protocol requests.
//!
//! The inner payload tags a sum of three request kinds through its `tipo`
//! field. Decoding is two-step so an unknown tag is distinguishable from a
//! payload whose `datos` do not match its declared tag.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Credentials carried by `registro` and `login` requests.
///
/// Fields default to empty strings when absent; the server treats an empty
/// field the same as a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credenciales {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Fields of a `transaccion` request.
///
/// Accounts are opaque strings; amounts must be positive. Presence is
/// validated at dispatch, not during decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transferencia {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cuenta_origen: String,
    #[serde(default)]
    pub cuenta_destino: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cantidad: Option<f64>,
}

/// A typed request, discriminated by the wire `tipo` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tipo", content = "datos", rename_all = "lowercase")]
pub enum Request {
    Registro(Credenciales),
    Login(Credenciales),
    Transaccion(Transferencia),
}

impl Request {
    /// Wire tag of this request, for dispatch logging.
    pub fn tipo(&self) -> &'static str {
        match self {
            Request::Registro(_) => "registro",
            Request::Login(_) => "login",
            Request::Transaccion(_) => "transaccion",
        }
    }
}

#[derive(Deserialize)]
struct RawPayload {
    tipo: String,
    #[serde(default)]
    datos: serde_json::Value,
}

/// Parse an inner payload into a typed [`Request`].
pub fn decode_payload(payload: &[u8]) -> Result<Request, ProtocolError> {
    let raw: RawPayload = serde_json::from_slice(payload)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    match raw.tipo.as_str() {
        "registro" => Ok(Request::Registro(parse_datos(raw.datos)?)),
        "login" => Ok(Request::Login(parse_datos(raw.datos)?)),
        "transaccion" => Ok(Request::Transaccion(parse_datos(raw.datos)?)),
        other => Err(ProtocolError::UnsupportedType(other.to_string())),
    }
}

fn parse_datos<T: serde::de::DeserializeOwned>(datos: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(datos).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let request = Request::Login(Credenciales {
            username: "ana".into(),
            password: "Correct_pass1!".into(),
        });
        let payload = serde_json::to_vec(&request).unwrap();
        assert_eq!(decode_payload(&payload).unwrap(), request);
    }

    #[test]
    fn encoding_uses_tipo_and_datos() {
        let request = Request::Registro(Credenciales {
            username: "ana".into(),
            password: "s".into(),
        });
        let value: serde_json::Value =
            serde_json::from_slice(&serde_json::to_vec(&request).unwrap()).unwrap();
        assert_eq!(value["tipo"], "registro");
        assert_eq!(value["datos"]["username"], "ana");
    }

    #[test]
    fn unknown_tipo_is_unsupported() {
        let payload = br#"{"tipo": "logout", "datos": {}}"#;
        assert!(matches!(
            decode_payload(payload),
            Err(ProtocolError::UnsupportedType(t)) if t == "logout"
        ));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            decode_payload(b"esto no es json"),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let payload = br#"{"tipo": "login", "datos": {"username": "ana"}}"#;
        let Request::Login(c) = decode_payload(payload).unwrap() else {
            panic!("expected login");
        };
        assert_eq!(c.username, "ana");
        assert!(c.password.is_empty());
    }

    #[test]
    fn missing_cantidad_decodes_to_none() {
        let payload = br#"{"tipo": "transaccion", "datos": {"username": "ana",
            "cuenta_origen": "ES11", "cuenta_destino": "ES22"}}"#;
        let Request::Transaccion(t) = decode_payload(payload).unwrap() else {
            panic!("expected transaccion");
        };
        assert_eq!(t.cantidad, None);
    }

    #[test]
    fn wrongly_typed_datos_is_malformed() {
        let payload = br#"{"tipo": "transaccion", "datos": {"cantidad": "cien"}}"#;
        assert!(matches!(
            decode_payload(payload),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }
}
