//! Currency exchange rates from an external provider, cached in the database.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use time::Duration;

use crate::AppState;

mod client;
mod endpoint;
mod rate;

pub use client::ExchangeRateClient;
pub use endpoint::get_exchange_rate_endpoint;
pub use rate::{CurrencyRate, create_currency_rate_table};

/// The state needed by the currency route handlers.
#[derive(Debug, Clone)]
pub struct CurrencyState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// `None` if the server was started without an exchange rate API key.
    pub exchange_rate_client: Option<ExchangeRateClient>,
    /// How long a fetched rate is reused before asking the provider again.
    pub exchange_rate_ttl: Duration,
}

impl FromRef<AppState> for CurrencyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            exchange_rate_client: state.exchange_rate_client.clone(),
            exchange_rate_ttl: state.exchange_rate_ttl,
        }
    }
}
