use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bancx_server::config::ServerConfig;
use bancx_server::db::Store;
use bancx_server::server::Server;
use bancx_server::state::ServerContext;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuración inválida");
            std::process::exit(1);
        }
    };
    tracing::info!(host = config.host.as_str(), port = config.port, "configuración cargada");

    // Schema init and startup sweep, before the first connection.
    match Store::open(&config.db_path) {
        Ok(store) => {
            if let Err(e) = store.init_schema() {
                tracing::error!(error = %e, "fallo inicializando el esquema");
                std::process::exit(1);
            }
            tracing::info!(db = config.db_path.as_str(), "base de datos inicializada");

            match store.sweep_expired_nonces(chrono::Utc::now().timestamp()) {
                Ok(0) => {}
                Ok(n) => tracing::info!(n, "nonces expirados eliminados al arrancar"),
                Err(e) => tracing::warn!(error = %e, "fallo limpiando nonces al arrancar"),
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "fallo abriendo la base de datos");
            std::process::exit(1);
        }
    }

    spawn_nonce_sweeper(config.db_path.clone());

    let ctx = Arc::new(ServerContext::new(config));
    let server = Server::bind(ctx).await?;
    server.run(shutdown_signal()).await?;

    tracing::info!("servidor detenido");
    Ok(())
}

/// Periodic expired-nonce sweep so the table does not grow without bound.
fn spawn_nonce_sweeper(db_path: String) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await; // the first tick completes immediately
        loop {
            interval.tick().await;
            let path = db_path.clone();
            let swept = tokio::task::spawn_blocking(move || {
                Store::open(&path)?.sweep_expired_nonces(chrono::Utc::now().timestamp())
            })
            .await;
            match swept {
                Ok(Ok(0)) => {}
                Ok(Ok(n)) => tracing::debug!(n, "nonces expirados eliminados"),
                Ok(Err(e)) => tracing::warn!(error = %e, "fallo en la limpieza de nonces"),
                Err(e) => tracing::warn!(error = %e, "tarea de limpieza abortada"),
            }
        }
    });
}

/// Resolves on SIGINT, and additionally on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "fallo instalando el manejador de Ctrl-C");
        }
    };

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("fallo instalando el manejador de SIGTERM");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
