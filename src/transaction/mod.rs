//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its enums
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction API and CSV export

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod export;
mod form;
mod list_endpoint;
mod query;

pub use core::{
    Category, NewTransaction, PaymentMethod, Transaction, TransactionStatus, TransactionType,
    create_transaction, create_transaction_table, get_transaction, map_transaction_row,
    update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use export::{csv_attachment, export_transactions_endpoint, write_transactions_csv};
pub use list_endpoint::{
    get_transaction_endpoint, list_transactions_endpoint, recent_transactions_endpoint,
};
pub use query::{TransactionFilter, query_transactions};

/// The state needed by the transaction route handlers.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
