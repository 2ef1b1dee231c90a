//! Server configuration from the environment.

use std::env;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use bancx::constants::{DEFAULT_HOST, DEFAULT_PORT, KEY_SIZE};

/// On-disk fallback for the raw shared key when `SHARED_KEY` is unset.
const DEFAULT_KEY_FILE: &str = "config/shared_key.key";
/// Default SQLite database path.
const DEFAULT_DB_PATH: &str = "./bancx.db";

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite database path. Workers open their own handle against it.
    pub db_path: String,
    /// 32-byte HMAC key. Never logged.
    pub shared_key: Vec<u8>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("shared_key", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the environment (`SERVER_HOST`, `SERVER_PORT`,
    /// `DB_PATH`, `SHARED_KEY`), falling back to `config/shared_key.key` for
    /// the key. Fails fast when no key is available.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match env::var("SERVER_PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidPort(s))?,
            Err(_) => DEFAULT_PORT,
        };

        let db_path = env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let shared_key = load_shared_key()?;

        Ok(Self {
            host,
            port,
            db_path,
            shared_key,
        })
    }
}

fn load_shared_key() -> Result<Vec<u8>, ConfigError> {
    if let Ok(b64) = env::var("SHARED_KEY") {
        let key = BASE64.decode(b64.trim())?;
        return check_key_size(key);
    }

    let path = Path::new(DEFAULT_KEY_FILE);
    if path.exists() {
        let key = std::fs::read(path)?;
        return check_key_size(key);
    }

    Err(ConfigError::MissingKey)
}

fn check_key_size(key: Vec<u8>) -> Result<Vec<u8>, ConfigError> {
    if key.len() != KEY_SIZE {
        return Err(ConfigError::KeyWrongSize(key.len()));
    }
    Ok(key)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing shared key: set SHARED_KEY (base64) or provide config/shared_key.key")]
    MissingKey,

    #[error("SHARED_KEY is not valid base64: {0}")]
    KeyNotBase64(#[from] base64::DecodeError),

    #[error("shared key must be 32 bytes, got {0}")]
    KeyWrongSize(usize),

    #[error("invalid SERVER_PORT: {0}")]
    InvalidPort(String),

    #[error("failed to read the shared key file: {0}")]
    KeyFileUnreadable(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_the_shared_key() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 5000,
            db_path: ":memory:".into(),
            shared_key: vec![0x41; 32],
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("65"));
    }

    #[test]
    fn key_size_is_enforced() {
        assert!(matches!(
            check_key_size(vec![0u8; 16]),
            Err(ConfigError::KeyWrongSize(16))
        ));
        assert!(check_key_size(vec![0u8; 32]).is_ok());
    }
}
