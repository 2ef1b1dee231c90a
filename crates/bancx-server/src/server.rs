//! TCP connection server.
//!
//! One worker per accepted connection; each worker performs exactly one
//! request/response exchange and closes the socket. Workers never panic the
//! accept loop: every failure becomes either an error response or a logged
//! drop.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{self, JoinSet};

use bancx::constants::BUFFER_SIZE;
use bancx::message::Request;
use bancx::Response;

use crate::auth;
use crate::db::Store;
use crate::pipeline;
use crate::state::ServerContext;
use crate::transactions;

/// How long a worker waits for request bytes before giving up on the peer.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
}

impl Server {
    /// Bind the listening socket on the configured host and port. Port 0
    /// binds an ephemeral port.
    pub async fn bind(ctx: Arc<ServerContext>) -> io::Result<Self> {
        let addr = format!("{}:{}", ctx.config.host, ctx.config.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "servidor escuchando");
        Ok(Self { listener, ctx })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` resolves, then close the listener
    /// and wait for in-flight workers to finish.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let mut workers = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("señal de parada recibida, cerrando el listener");
                    break;
                }
                Some(_) = workers.join_next(), if !workers.is_empty() => {}
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((socket, addr)) => {
                            tracing::info!(%addr, "nueva conexión");
                            let ctx = Arc::clone(&self.ctx);
                            workers.spawn(async move {
                                handle_connection(ctx, socket, addr).await;
                                tracing::info!(%addr, "conexión cerrada");
                            });
                        }
                        Err(e) => tracing::error!(error = %e, "error aceptando conexión"),
                    }
                }
            }
        }

        drop(self.listener);
        while workers.join_next().await.is_some() {}
        Ok(())
    }
}

/// One request, one response, close.
async fn handle_connection(ctx: Arc<ServerContext>, mut socket: TcpStream, addr: SocketAddr) {
    let raw = match read_request(&mut socket).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::info!(%addr, "conexión cerrada sin datos");
            return;
        }
        Err(e) => {
            tracing::warn!(%addr, error = %e, "fallo leyendo la petición");
            return;
        }
    };

    // Argon2id and SQLite are blocking work; run the whole exchange on the
    // blocking pool so a hash in flight never stalls the accept loop.
    let worker_ctx = Arc::clone(&ctx);
    let response = match task::spawn_blocking(move || process_request(&worker_ctx, &raw)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(%addr, error = %e, "worker abortado");
            Response::error("Error interno del servidor")
        }
    };

    match serde_json::to_vec(&response) {
        Ok(bytes) => {
            if let Err(e) = socket.write_all(&bytes).await {
                // the peer went away; any committed side effects stand
                tracing::warn!(%addr, error = %e, "fallo escribiendo la respuesta");
            }
        }
        Err(e) => tracing::error!(%addr, error = %e, "fallo serializando la respuesta"),
    }
}

/// Read one request: up to a full buffer, EOF, or the read timeout. Returns
/// `None` when the peer sent nothing.
async fn read_request(socket: &mut TcpStream) -> io::Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut filled = 0;

    while filled < buf.len() {
        match tokio::time::timeout(READ_TIMEOUT, socket.read(&mut buf[filled..])).await {
            Ok(Ok(0)) => break,            // peer half-closed
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(e),
            Err(_) if filled > 0 => break, // slow peer: process what arrived
            Err(_) => return Ok(None),     // nothing within the timeout
        }
    }

    if filled == 0 {
        return Ok(None);
    }
    buf.truncate(filled);
    Ok(Some(buf))
}

/// Process one raw request synchronously: open a store handle, run the
/// validation pipeline, dispatch by type. Every failure is translated into a
/// wire response here; nothing propagates to the accept loop.
pub fn process_request(ctx: &ServerContext, raw: &[u8]) -> Response {
    let store = match Store::open(&ctx.config.db_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "fallo abriendo la base de datos");
            return Response::error("Error interno del servidor");
        }
    };

    let request = match pipeline::validate(&ctx.config.shared_key, &store, raw) {
        Ok(request) => request,
        Err(rejection) => return Response::error(rejection.mensaje()),
    };
    tracing::info!(tipo = request.tipo(), "mensaje válido");

    dispatch(ctx, &store, &request)
}

fn dispatch(ctx: &ServerContext, store: &Store, request: &Request) -> Response {
    match request {
        Request::Registro(c) => {
            if c.username.is_empty() || c.password.is_empty() {
                return Response::error("Faltan datos de registro");
            }
            match auth::register(store, &c.username, &c.password) {
                Ok(msg) => Response::ok(msg),
                Err(e) => Response::error(e.to_string()),
            }
        }
        Request::Login(c) => {
            if c.username.is_empty() || c.password.is_empty() {
                return Response::error("Faltan credenciales");
            }
            match auth::login(store, &ctx.limiter, &c.username, &c.password) {
                Ok(msg) => Response::ok(msg),
                Err(e) => Response::error(e.to_string()),
            }
        }
        Request::Transaccion(t) => match transactions::process(store, t) {
            Ok(id) => Response::ok_with(
                format!("Transferencia completada (ID: {id})"),
                serde_json::json!({ "id": id }),
            ),
            Err(e) => Response::error(e.to_string()),
        },
    }
}
