//! Authenticated message protocol for the bancx banking demonstrator.
//!
//! Provides integrity and replay protection for a connection-per-request
//! protocol: every request travels in an envelope carrying the payload, an
//! HMAC-SHA256 tag over payload and nonce, and a single-use 32-byte nonce.
//! Messages are authenticated, not encrypted.
//!
//! # Wire shape
//!
//! The outer envelope is a single UTF-8 JSON document:
//!
//! ```json
//! { "mensaje": "<base64 payload>", "mac": "<base64 tag>", "nonce": "<base64 nonce>" }
//! ```
//!
//! The payload is itself JSON, tagged by `tipo`:
//!
//! ```json
//! { "tipo": "registro" | "login" | "transaccion", "datos": { ... } }
//! ```
//!
//! Responses are plain JSON (`{ "status", "mensaje", "datos"? }`) and carry
//! no MAC.
//!
//! This crate holds the pure protocol pieces shared by client and server:
//! codec, crypto primitives, and constants. Storage, validation and the
//! connection server live in `bancx-server`.

pub mod constants;
pub mod envelope;
pub mod error;
pub mod mac;
pub mod message;
pub mod nonce;
pub mod password;
pub mod response;
pub mod security;

pub use envelope::{pack, unpack, Envelope, Unpacked};
pub use error::ProtocolError;
pub use message::{decode_payload, Credenciales, Request, Transferencia};
pub use response::{Response, Status};
