//! A client for the bank-link provider's API.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use time::Date;

use crate::{Error, dates};

/// The name used for the bank-link provider in errors and logs.
pub(crate) const PROVIDER: &str = "Bank link";

/// The most transactions the provider returns per page.
const PAGE_SIZE: usize = 500;

/// The provider deployment to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BankLinkEnvironment {
    /// Test credentials and fake institutions.
    Sandbox,
    /// Real institutions with a limited number of items.
    Development,
    Production,
}

impl BankLinkEnvironment {
    /// The API host for the environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.plaid.com",
            Self::Development => "https://development.plaid.com",
            Self::Production => "https://production.plaid.com",
        }
    }
}

/// Calls the bank-link provider on behalf of the server.
///
/// Every request carries the server's client ID and secret in its JSON body.
#[derive(Clone)]
pub struct BankLinkClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl std::fmt::Debug for BankLinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankLinkClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// The result of exchanging a public token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenExchange {
    pub access_token: String,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct AccountBalances {
    pub available: Option<f64>,
    pub current: Option<f64>,
    pub iso_currency_code: Option<String>,
}

/// A bank account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct BankAccount {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    pub balances: AccountBalances,
}

/// A transaction as reported by the provider.
///
/// Positive amounts are money leaving the account.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct BankTransaction {
    pub transaction_id: String,
    pub account_id: String,
    pub amount: f64,
    #[serde(with = "dates::iso_date")]
    pub date: Date,
    pub name: String,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<BankAccount>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<BankTransaction>,
    total_transactions: usize,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    error_message: String,
}

impl BankLinkClient {
    pub fn new(client_id: &str, secret: &str, environment: BankLinkEnvironment) -> Self {
        Self::with_base_url(client_id, secret, environment.base_url())
    }

    /// Create a client that sends requests to `base_url`.
    pub fn with_base_url(client_id: &str, secret: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            client_id: client_id.to_owned(),
            secret: secret.to_owned(),
        }
    }

    /// POST `body` plus the client credentials to `path` and parse the JSON response.
    async fn post<T: DeserializeOwned>(&self, path: &str, mut body: Value) -> Result<T, Error> {
        if let Some(fields) = body.as_object_mut() {
            fields.insert("client_id".to_owned(), json!(self.client_id));
            fields.insert("secret".to_owned(), json!(self.secret));
        }

        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|error| Error::Upstream(PROVIDER, error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = match response.json::<ProviderError>().await {
                Ok(error) => format!("{path} {status}: {} {}", error.error_code, error.error_message),
                Err(_) => format!("{path} {status}"),
            };
            return Err(Error::Upstream(PROVIDER, reason));
        }

        response
            .json()
            .await
            .map_err(|error| Error::Upstream(PROVIDER, format!("{path}: {error}")))
    }

    /// Exchange the short-lived public token from the client's link flow for an access token.
    ///
    /// # Errors
    /// Returns [Error::Upstream] if the provider call fails.
    pub async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange, Error> {
        self.post(
            "/item/public_token/exchange",
            json!({ "public_token": public_token }),
        )
        .await
    }

    /// Get the accounts and their current balances.
    ///
    /// # Errors
    /// Returns [Error::Upstream] if the provider call fails.
    pub async fn get_balances(&self, access_token: &str) -> Result<Vec<BankAccount>, Error> {
        let response: AccountsResponse = self
            .post(
                "/accounts/balance/get",
                json!({ "access_token": access_token }),
            )
            .await?;

        Ok(response.accounts)
    }

    /// Get every transaction dated from `start_date` to `end_date` inclusive.
    ///
    /// Pages through the results until all transactions have been fetched.
    ///
    /// # Errors
    /// Returns [Error::Upstream] if a provider call fails.
    pub async fn get_transactions(
        &self,
        access_token: &str,
        start_date: Date,
        end_date: Date,
    ) -> Result<Vec<BankTransaction>, Error> {
        let mut transactions = Vec::new();

        loop {
            let page: TransactionsResponse = self
                .post(
                    "/transactions/get",
                    json!({
                        "access_token": access_token,
                        "start_date": dates::format_iso_date(start_date),
                        "end_date": dates::format_iso_date(end_date),
                        "options": { "count": PAGE_SIZE, "offset": transactions.len() },
                    }),
                )
                .await?;

            let page_size = page.transactions.len();
            transactions.extend(page.transactions);

            if page_size == 0 || transactions.len() >= page.total_transactions {
                return Ok(transactions);
            }
        }
    }

    /// Revoke the access token so the provider stops sharing the user's data.
    ///
    /// # Errors
    /// Returns [Error::Upstream] if the provider call fails.
    pub async fn remove_item(&self, access_token: &str) -> Result<(), Error> {
        let _: Value = self
            .post("/item/remove", json!({ "access_token": access_token }))
            .await?;

        Ok(())
    }
}
