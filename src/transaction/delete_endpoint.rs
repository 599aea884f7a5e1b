use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::AuthUser,
    database_id::TransactionId,
    transaction::{TransactionState, core::delete_transaction},
};

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let Path(transaction_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Transaction deleted" })))
}
