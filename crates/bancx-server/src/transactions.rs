//! Transfer intents.
//!
//! A transfer is recorded, not executed: no balances are kept and account
//! strings are opaque. The audit row states that an authenticated request
//! asked for the movement.

use thiserror::Error;

use bancx::message::Transferencia;

use crate::db::{Store, StoreError};

#[derive(Debug, Error)]
pub enum TransactionError {
    /// A field is missing or empty, or the amount is not positive.
    #[error("Faltan datos de la transaccion")]
    MissingFields,

    #[error("Error al procesar la transferencia")]
    Store(#[source] StoreError),
}

/// Validate a transfer request and append its audit record, returning the
/// assigned id.
pub fn process(store: &Store, transfer: &Transferencia) -> Result<i64, TransactionError> {
    let cantidad = match transfer.cantidad {
        Some(c) if c > 0.0 => c,
        _ => return Err(TransactionError::MissingFields),
    };
    if transfer.username.is_empty()
        || transfer.cuenta_origen.is_empty()
        || transfer.cuenta_destino.is_empty()
    {
        return Err(TransactionError::MissingFields);
    }

    let id = store
        .append_transaction(
            &transfer.username,
            &transfer.cuenta_origen,
            &transfer.cuenta_destino,
            cantidad,
            true,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "fallo al registrar la transferencia");
            TransactionError::Store(e)
        })?;

    tracing::info!(
        id,
        username = transfer.username.as_str(),
        cantidad,
        "transferencia registrada"
    );
    Ok(id)
}
