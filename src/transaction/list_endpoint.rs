//! Route handlers for reading transactions.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::Deserialize;

use crate::{
    Error,
    auth::AuthUser,
    database_id::TransactionId,
    timezone::local_today,
    transaction::{
        Transaction, TransactionState,
        core::get_transaction,
        query::{TransactionFilter, TransactionQuery, query_transactions},
    },
};

/// The number of transactions returned by the recent transactions endpoint by default.
const DEFAULT_RECENT_LIMIT: u32 = 5;
/// The most transactions the recent transactions endpoint will return.
const MAX_RECENT_LIMIT: u32 = 100;

/// A route handler for listing the user's transactions, newest first.
///
/// See [TransactionQuery] for the supported filters.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(query) = query?;
    let filter = query.into_filter(local_today(&state.local_timezone)?)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    query_transactions(user_id, &filter, None, &connection).map(Json)
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<u32>,
}

/// A route handler for getting the user's most recent transactions.
///
/// `limit` defaults to 5 and is capped at 100.
pub async fn recent_transactions_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    query_transactions(
        user_id,
        &TransactionFilter::default(),
        Some(limit),
        &connection,
    )
    .map(Json)
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<Transaction>, Error> {
    let Path(transaction_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}
