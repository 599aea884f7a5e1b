//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    BankLinkClient, Error, ExchangeRateClient,
    auth::{DEFAULT_TOKEN_DURATION, JwtKeys},
    db::initialize,
    timezone::get_local_offset,
};

/// How long a fetched exchange rate is reused if the server is not configured otherwise.
pub const DEFAULT_EXCHANGE_RATE_TTL: Duration = Duration::hours(1);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys used to sign and verify bearer tokens.
    pub jwt_keys: JwtKeys,

    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The bank-link provider client, `None` if the provider is not configured.
    pub bank_link_client: Option<BankLinkClient>,

    /// The exchange rate provider client, `None` if the provider is not configured.
    pub exchange_rate_client: Option<ExchangeRateClient>,

    /// How long a cached exchange rate is served before it is fetched again.
    pub exchange_rate_ttl: Duration,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or if `local_timezone` is
    /// not a known timezone.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: connection,
            bank_link_client: None,
            exchange_rate_client: None,
            exchange_rate_ttl: DEFAULT_EXCHANGE_RATE_TTL,
        })
    }

    /// Set how long issued bearer tokens are valid for.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Enable the bank-link endpoints.
    pub fn with_bank_link_client(mut self, client: BankLinkClient) -> Self {
        self.bank_link_client = Some(client);
        self
    }

    /// Enable fetching exchange rates from the provider.
    pub fn with_exchange_rate_client(mut self, client: ExchangeRateClient) -> Self {
        self.exchange_rate_client = Some(client);
        self
    }

    /// Set how long a cached exchange rate is served before it is fetched again.
    pub fn with_exchange_rate_ttl(mut self, ttl: Duration) -> Self {
        self.exchange_rate_ttl = ttl;
        self
    }
}
