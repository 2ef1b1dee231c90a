//! Registration and login over the store.
//!
//! Login narrows its timing side channel by treating an unknown user exactly
//! like a wrong password, and the lockout gate runs before any credential
//! work, so a locked user is refused even with the correct password.

use thiserror::Error;

use bancx::password;

use crate::db::{Store, StoreError};
use crate::rate_limit::{Gate, RateLimiter};
use crate::validation::validate_password_strength;

/// Authentication failures. `Display` yields the stable user-visible
/// message sent on the wire.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    PasswordWeak(&'static str),

    #[error("El usuario ya existe")]
    AlreadyExists,

    #[error("Error al procesar la contraseña")]
    Hashing,

    #[error("Error al crear el usuario")]
    Store(#[source] StoreError),

    /// Unknown user and wrong password share this message.
    #[error("Credenciales incorrectas")]
    CredentialMismatch,

    #[error("Usuario bloqueado. Intenta en {0} minuto(s)")]
    Locked(u64),
}

/// Register a new user: strength policy, uniqueness, Argon2id hash, insert.
pub fn register(store: &Store, username: &str, password: &str) -> Result<String, AuthError> {
    validate_password_strength(password).map_err(AuthError::PasswordWeak)?;

    match store.get_password_hash(username) {
        Ok(Some(_)) => {
            tracing::warn!(username, "intento de registro con usuario existente");
            return Err(AuthError::AlreadyExists);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(username, error = %e, "fallo consultando usuarios");
            return Err(AuthError::Store(e));
        }
    }

    let hash = password::hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "fallo al hashear la contraseña");
        AuthError::Hashing
    })?;

    match store.create_user(username, &hash) {
        Ok(()) => {
            tracing::info!(username, "usuario registrado");
            Ok("Usuario registrado exitosamente".to_string())
        }
        // raced with a concurrent registration of the same name
        Err(StoreError::UserExists) => {
            tracing::warn!(username, "intento de registro con usuario existente");
            Err(AuthError::AlreadyExists)
        }
        Err(e) => {
            tracing::error!(username, error = %e, "fallo al crear usuario");
            Err(AuthError::Store(e))
        }
    }
}

/// Log a user in: lockout gate, hash lookup, Argon2id verify, then notify
/// the limiter of the outcome.
pub fn login(
    store: &Store,
    limiter: &RateLimiter,
    username: &str,
    password: &str,
) -> Result<String, AuthError> {
    if let Gate::Locked { minutos } = limiter.may_attempt(username) {
        tracing::warn!(username, minutos, "login rechazado: usuario bloqueado");
        return Err(AuthError::Locked(minutos));
    }

    let stored = match store.get_password_hash(username) {
        Ok(stored) => stored,
        Err(e) => {
            // fail closed: an unreadable store is a mismatch
            tracing::error!(username, error = %e, "fallo consultando credenciales");
            None
        }
    };

    let ok = match stored {
        Some(hash) => password::verify_password(&hash, password),
        None => false,
    };

    limiter.record(username, ok);

    if ok {
        tracing::info!(username, "login exitoso");
        Ok("Login exitoso".to_string())
    } else {
        tracing::warn!(username, "credenciales incorrectas");
        Err(AuthError::CredentialMismatch)
    }
}
