//! Server responses. Plain JSON on the wire, not authenticated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response status: exactly `"ok"` or `"error"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// A server response: status, a human-readable message, and optional data.
///
/// `datos` is always present (possibly empty) on success and omitted on
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub mensaje: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datos: Option<Value>,
}

impl Response {
    /// Success with no extra data.
    pub fn ok(mensaje: impl Into<String>) -> Self {
        Self::ok_with(mensaje, Value::Object(Default::default()))
    }

    /// Success carrying operation data.
    pub fn ok_with(mensaje: impl Into<String>, datos: Value) -> Self {
        Self {
            status: Status::Ok,
            mensaje: mensaje.into(),
            datos: Some(datos),
        }
    }

    /// Error with a stable user-visible message.
    pub fn error(mensaje: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            mensaje: mensaje.into(),
            datos: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_carries_empty_datos() {
        let value = serde_json::to_value(Response::ok("Login exitoso")).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["mensaje"], "Login exitoso");
        assert!(value["datos"].as_object().unwrap().is_empty());
    }

    #[test]
    fn error_omits_datos() {
        let value = serde_json::to_value(Response::error("Mensaje malformado")).unwrap();
        assert_eq!(value["status"], "error");
        assert!(value.get("datos").is_none());
    }

    #[test]
    fn parses_wire_response() {
        let raw = br#"{"status": "ok", "mensaje": "listo", "datos": {"id": 3}}"#;
        let response: Response = serde_json::from_slice(raw).unwrap();
        assert!(response.is_ok());
        assert_eq!(response.datos.unwrap()["id"], 3);
    }
}
