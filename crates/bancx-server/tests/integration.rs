//! End-to-end tests over real sockets: register, login, transfer, replay,
//! tampering, lockout and persistence.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::io::AsyncWriteExt;

use bancx::message::{Credenciales, Transferencia};
use bancx::{pack, Envelope, Request};
use bancx_client::Client;
use bancx_server::config::ServerConfig;
use bancx_server::db::Store;
use bancx_server::server::Server;
use bancx_server::state::ServerContext;

const KEY: [u8; 32] = [0x42; 32];

struct TestServer {
    client: Client,
    addr: String,
    db_path: String,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bancx.db").to_str().unwrap().to_string();

        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            db_path: db_path.clone(),
            shared_key: KEY.to_vec(),
        };

        let store = Store::open(&db_path).unwrap();
        store.init_schema().unwrap();

        let ctx = Arc::new(ServerContext::new(config));
        let server = Server::bind(ctx).await.unwrap();
        let addr = server.local_addr().unwrap().to_string();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.run(async move {
            let _ = rx.await;
        }));

        Self {
            client: Client::new(addr.clone(), KEY.to_vec()),
            addr,
            db_path,
            shutdown: Some(tx),
            handle,
            _dir: dir,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }

    fn store(&self) -> Store {
        Store::open(&self.db_path).unwrap()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn register_login_and_transfer() {
    let server = TestServer::start().await;
    let client = &server.client;

    let response = client.register("test_user", "Correct_pass1!").await.unwrap();
    assert!(response.is_ok(), "{}", response.mensaje);

    let response = client.login("test_user", "Wrong_pass99!").await.unwrap();
    assert!(!response.is_ok());
    assert_eq!(response.mensaje, "Credenciales incorrectas");

    let response = client.login("test_user", "Correct_pass1!").await.unwrap();
    assert!(response.is_ok());
    assert_eq!(response.mensaje, "Login exitoso");

    let response = client
        .transfer("test_user", "ES1234567890", "ES0987654321", 100.50)
        .await
        .unwrap();
    assert!(response.is_ok());
    assert!(response.mensaje.contains("Transferencia completada"));

    let rows = server.store().list_transactions("test_user").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cantidad, 100.50);
    assert_eq!(rows[0].cuenta_origen, "ES1234567890");
    assert_eq!(rows[0].cuenta_destino, "ES0987654321");

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registration_is_rejected() {
    let server = TestServer::start().await;

    let first = server.client.register("dup", "Correct_pass1!").await.unwrap();
    assert!(first.is_ok());

    let second = server.client.register("dup", "Correct_pass1!").await.unwrap();
    assert!(!second.is_ok());
    assert_eq!(second.mensaje, "El usuario ya existe");
}

#[tokio::test(flavor = "multi_thread")]
async fn replayed_envelope_is_detected() {
    let server = TestServer::start().await;
    let client = &server.client;

    client.register("test_replay", "Correct_pass1!").await.unwrap();
    client.login("test_replay", "Correct_pass1!").await.unwrap();

    let raw = pack(
        &KEY,
        &Request::Transaccion(Transferencia {
            username: "test_replay".into(),
            cuenta_origen: "ES1234567890129012".into(),
            cuenta_destino: "ES9876543210981098".into(),
            cantidad: Some(100.00),
        }),
    )
    .unwrap();

    let first = client.send_raw(&raw).await.unwrap();
    assert!(first.is_ok(), "{}", first.mensaje);

    // identical bytes on a fresh connection
    let second = client.send_raw(&raw).await.unwrap();
    assert!(!second.is_ok());
    assert!(second.mensaje.contains("NONCE"), "{}", second.mensaje);

    let rows = server.store().list_transactions("test_replay").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cantidad, 100.00);
}

#[tokio::test(flavor = "multi_thread")]
async fn tampered_payload_is_detected() {
    let server = TestServer::start().await;

    let raw = pack(
        &KEY,
        &Request::Login(Credenciales {
            username: "test_user".into(),
            password: "Correct_pass1!".into(),
        }),
    )
    .unwrap();

    // alter the payload while keeping the original MAC and nonce
    let mut outer: Envelope = serde_json::from_slice(&raw).unwrap();
    let payload = String::from_utf8(BASE64.decode(&outer.mensaje).unwrap()).unwrap();
    outer.mensaje = BASE64.encode(payload.replace("test", "hack").as_bytes());
    let tampered = serde_json::to_vec(&outer).unwrap();

    let response = server.client.send_raw(&tampered).await.unwrap();
    assert!(!response.is_ok());
    assert!(response.mensaje.contains("MAC"), "{}", response.mensaje);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_envelope_is_answered() {
    let server = TestServer::start().await;

    let response = server.client.send_raw(b"BASURA_NO_JSON_12345").await.unwrap();
    assert!(!response.is_ok());
    assert_eq!(response.mensaje, "Mensaje malformado");
}

#[tokio::test(flavor = "multi_thread")]
async fn brute_force_triggers_lockout_even_for_the_correct_password() {
    let server = TestServer::start().await;
    let client = &server.client;

    client.register("brute", "Correct_Pass123!").await.unwrap();

    let mut saw_lockout = false;
    for _ in 0..6 {
        let response = client.login("brute", "Wrong_pass99!").await.unwrap();
        assert!(!response.is_ok());
        if response.mensaje.contains("bloqueado") {
            saw_lockout = true;
        }
    }
    assert!(saw_lockout, "no attempt was answered with a lockout");

    // the correct password is still refused while locked
    let response = client.login("brute", "Correct_Pass123!").await.unwrap();
    assert!(!response.is_ok());
    assert!(response.mensaje.contains("bloqueado"), "{}", response.mensaje);
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_password_hash_is_argon2() {
    let server = TestServer::start().await;

    server.client.register("persist", "Correct_pass1!").await.unwrap();

    let hash = server
        .store()
        .get_password_hash("persist")
        .unwrap()
        .expect("user row must exist");
    assert!(hash.starts_with("$argon2"), "{hash}");
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_connections_do_not_wedge_the_server() {
    let server = TestServer::start().await;

    // connect and say nothing; the server closes it quietly
    let mut socket = tokio::net::TcpStream::connect(&server.addr).await.unwrap();
    socket.shutdown().await.unwrap();

    // and keeps serving afterwards
    let response = server.client.register("viva", "Correct_pass1!").await.unwrap();
    assert!(response.is_ok());

    server.stop().await;
}
