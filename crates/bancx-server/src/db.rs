//! SQLite-backed persistent store: users, nonces, and the transaction audit
//! table.
//!
//! Each connection worker opens its own [`Store`] handle; WAL journaling and
//! a busy timeout serialize overlapping writers. Nonce admission leans on the
//! UNIQUE constraint so the insert itself is the atomic test-and-set.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;
use thiserror::Error;

// SQLITE_CONSTRAINT_UNIQUE
const CONSTRAINT_UNIQUE: i32 = 2067;

/// Row of the `transacciones` audit table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub username: String,
    pub cuenta_origen: String,
    pub cuenta_destino: String,
    pub cantidad: f64,
    pub mac_verificado: bool,
    pub timestamp: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user already exists")]
    UserExists,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Handle to the SQLite store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a store handle at `path`.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Create tables and indexes if missing. Called once at startup, before
    /// the first connection is accepted.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS usuarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transacciones (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                cuenta_origen TEXT NOT NULL,
                cuenta_destino TEXT NOT NULL,
                cantidad REAL NOT NULL,
                mac_verificado INTEGER NOT NULL,
                timestamp TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS nonces (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                valor BLOB UNIQUE NOT NULL,
                expira TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_transacciones_username
                ON transacciones(username);
            CREATE INDEX IF NOT EXISTS idx_nonces_expira
                ON nonces(expira);
            "#,
        )?;
        Ok(())
    }

    /// Insert a new user. Usernames are unique and case-sensitive.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        match self.conn.execute(
            "INSERT INTO usuarios (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, now],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.extended_code == CONSTRAINT_UNIQUE => {
                Err(StoreError::UserExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a user's stored password hash, or `None` if the user does not
    /// exist.
    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT password_hash FROM usuarios WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Atomically admit a nonce: insert-if-absent with a TTL.
    ///
    /// Returns `true` when the nonce was admitted and `false` when its value
    /// is already present (a replay). Concurrent admissions of the same value
    /// race on the UNIQUE constraint, so exactly one wins.
    pub fn admit_nonce(&self, valor: &[u8], ttl_secs: i64) -> Result<bool, StoreError> {
        let expira = chrono::Utc::now().timestamp() + ttl_secs;
        match self.conn.execute(
            "INSERT INTO nonces (valor, expira) VALUES (?1, ?2)",
            params![valor, expira],
        ) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.extended_code == CONSTRAINT_UNIQUE => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete nonces whose TTL elapsed before `now`. Idempotent and safe to
    /// run concurrently with admission; a swept value becomes admissible
    /// again.
    pub fn sweep_expired_nonces(&self, now: i64) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .execute("DELETE FROM nonces WHERE expira < ?1", params![now])?)
    }

    /// Append an audit record and return its assigned id.
    pub fn append_transaction(
        &self,
        username: &str,
        cuenta_origen: &str,
        cuenta_destino: &str,
        cantidad: f64,
        mac_verificado: bool,
    ) -> Result<i64, StoreError> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            r#"
            INSERT INTO transacciones
                (username, cuenta_origen, cuenta_destino, cantidad, mac_verificado, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![username, cuenta_origen, cuenta_destino, cantidad, mac_verificado, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List a user's audit records, newest first.
    pub fn list_transactions(&self, username: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, username, cuenta_origen, cuenta_destino, cantidad, mac_verificado, timestamp
            FROM transacciones
            WHERE username = ?1
            ORDER BY timestamp DESC, id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![username], |row| {
                Ok(TransactionRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    cuenta_origen: row.get(2)?,
                    cuenta_destino: row.get(3)?,
                    cantidad: row.get(4)?,
                    mac_verificado: row.get::<_, i64>(5)? != 0,
                    timestamp: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
