//! Defines the endpoint for creating a new transaction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::record_budget_alerts,
    auth::AuthUser,
    endpoints::{self, format_endpoint},
    timezone::local_today,
    transaction::{TransactionState, core::create_transaction, form::TransactionForm},
};

/// A route handler for creating a new transaction, responds with 201 and the created transaction.
///
/// Expenses that push an alert-enabled budget over its threshold also record an alert.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    form: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = form?;
    let today = local_today(&state.local_timezone)?;
    let new_transaction = form.validate(today)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, &new_transaction, &connection)?;

    if let Err(error) = record_budget_alerts(user_id, &transaction, None, today, &connection) {
        tracing::error!(
            "Could not check budget alerts for transaction {}: {error}",
            transaction.id
        );
    }

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format_endpoint(endpoints::TRANSACTION, transaction.id))],
        Json(transaction),
    )
        .into_response())
}
