//! Linking a bank account through the bank-link provider.
//!
//! Users finish the provider's link flow in the browser, which gives the
//! client a short-lived public token. The server exchanges it for a long-lived
//! access token, stores that token, and uses it to read balances and
//! transactions on the user's behalf.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod client;
mod endpoints;
mod import;
mod link;

pub use client::{BankLinkClient, BankLinkEnvironment};
pub use endpoints::{
    balances_endpoint, bank_transactions_endpoint, disconnect_endpoint,
    exchange_public_token_endpoint, import_endpoint,
};
pub use link::create_bank_link_table;

/// The state needed by the bank-link route handlers.
#[derive(Debug, Clone)]
pub struct BankLinkState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// `None` if the server was started without bank-link credentials.
    pub bank_link_client: Option<BankLinkClient>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BankLinkState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            bank_link_client: state.bank_link_client.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
