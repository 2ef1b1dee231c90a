//! Client transport for the bancx protocol.
//!
//! Each call opens a TCP connection, sends one authenticated envelope,
//! half-closes the write side, reads the plain-JSON response to EOF and
//! returns it. There are no sessions; every request stands alone.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use bancx::constants::BUFFER_SIZE;
use bancx::message::{Credenciales, Request, Transferencia};
use bancx::{pack, ProtocolError, Response};

/// How long to wait for the server's response.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("server did not answer in time")]
    Timeout,
}

/// A client bound to one server address and shared key.
#[derive(Clone)]
pub struct Client {
    addr: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("addr", &self.addr)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Client {
    pub fn new(addr: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            addr: addr.into(),
            key: key.into(),
        }
    }

    /// Pack a typed request and perform one exchange.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let raw = pack(&self.key, request)?;
        self.send_raw(&raw).await
    }

    /// Send pre-packed envelope bytes verbatim.
    ///
    /// The server admits each nonce once, so resending captured bytes is
    /// answered with a replay rejection.
    pub async fn send_raw(&self, raw: &[u8]) -> Result<Response, ClientError> {
        let mut socket = TcpStream::connect(&self.addr).await?;
        socket.write_all(raw).await?;
        // half-close so the server sees EOF after the envelope
        socket.shutdown().await?;

        let mut buf = Vec::with_capacity(BUFFER_SIZE);
        tokio::time::timeout(RESPONSE_TIMEOUT, socket.read_to_end(&mut buf))
            .await
            .map_err(|_| ClientError::Timeout)??;

        Ok(serde_json::from_slice(&buf)?)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Response, ClientError> {
        self.send(&Request::Registro(Credenciales {
            username: username.into(),
            password: password.into(),
        }))
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response, ClientError> {
        self.send(&Request::Login(Credenciales {
            username: username.into(),
            password: password.into(),
        }))
        .await
    }

    pub async fn transfer(
        &self,
        username: &str,
        cuenta_origen: &str,
        cuenta_destino: &str,
        cantidad: f64,
    ) -> Result<Response, ClientError> {
        self.send(&Request::Transaccion(Transferencia {
            username: username.into(),
            cuenta_origen: cuenta_origen.into(),
            cuenta_destino: cuenta_destino.into(),
            cantidad: Some(cantidad),
        }))
        .await
    }
}
