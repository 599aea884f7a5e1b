//! Route handlers for linking a bank and reading its data.
//!
//! The database lock is released before every provider call.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use time::{Date, Duration};

use crate::{
    Error, UserID,
    auth::AuthUser,
    bank_link::{
        BankLinkClient, BankLinkState,
        client::{BankAccount, BankTransaction, PROVIDER},
        import::{ImportSummary, import_bank_transactions},
        link::{delete_bank_link, get_bank_link, save_bank_link},
    },
    dates,
    timezone::local_today,
    validation::Validator,
};

/// How many days of transactions to fetch when no range is given.
const DEFAULT_HISTORY_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTokenRequest {
    pub public_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransactionsQuery {
    #[serde(default, with = "dates::option_iso_date")]
    pub start_date: Option<Date>,
    #[serde(default, with = "dates::option_iso_date")]
    pub end_date: Option<Date>,
}

impl BankTransactionsQuery {
    /// The inclusive range to fetch, defaulting to the last 30 days up to `today`.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the dates are out of order or the default
    /// start date would fall before the earliest representable date.
    fn range(&self, today: Date) -> Result<(Date, Date), Error> {
        let end_date = self.end_date.unwrap_or(today);
        let start_date = self
            .start_date
            .or_else(|| end_date.checked_sub(Duration::days(DEFAULT_HISTORY_DAYS)));

        let mut validator = Validator::new();
        validator.check(start_date.is_some(), "endDate", "endDate is out of range");
        if let Some(start_date) = start_date {
            validator.check(
                start_date <= end_date,
                "endDate",
                "endDate must not be before startDate",
            );
        }
        validator.finish()?;

        start_date
            .map(|start_date| (start_date, end_date))
            .ok_or_else(|| Error::MalformedRequest("endDate is out of range".to_owned()))
    }
}

fn client(state: &BankLinkState) -> Result<&BankLinkClient, Error> {
    state
        .bank_link_client
        .as_ref()
        .ok_or(Error::ProviderNotConfigured(PROVIDER))
}

fn access_token(state: &BankLinkState, user_id: UserID) -> Result<String, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(get_bank_link(user_id, &connection)?.access_token)
}

/// A route handler for finishing the link flow.
///
/// Exchanges the public token for an access token and stores it for the user.
pub async fn exchange_public_token_endpoint(
    State(state): State<BankLinkState>,
    AuthUser(user_id): AuthUser,
    request: Result<Json<ExchangeTokenRequest>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(request) = request?;
    let mut validator = Validator::new();
    let public_token = validator.require_text("publicToken", request.public_token);
    validator.finish()?;
    let Some(public_token) = public_token else {
        return Err(Error::MalformedRequest("publicToken is required".to_owned()));
    };

    let exchange = client(&state)?.exchange_public_token(&public_token).await?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let link = save_bank_link(user_id, &exchange.access_token, &exchange.item_id, &connection)?;
    tracing::info!("User {user_id} linked bank item {}", link.item_id);

    Ok(Json(json!({
        "message": "Bank account linked",
        "itemId": link.item_id,
    })))
}

/// A route handler for the balances of the user's linked accounts.
pub async fn balances_endpoint(
    State(state): State<BankLinkState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, Error> {
    let client = client(&state)?;
    let access_token = access_token(&state, user_id)?;

    let accounts: Vec<BankAccount> = client.get_balances(&access_token).await?;

    Ok(Json(json!({ "accounts": accounts })))
}

/// A route handler for the transactions of the user's linked accounts.
pub async fn bank_transactions_endpoint(
    State(state): State<BankLinkState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<BankTransactionsQuery>, QueryRejection>,
) -> Result<Json<Value>, Error> {
    let Query(query) = query?;
    let (start_date, end_date) = query.range(local_today(&state.local_timezone)?)?;
    let client = client(&state)?;
    let access_token = access_token(&state, user_id)?;

    let transactions: Vec<BankTransaction> = client
        .get_transactions(&access_token, start_date, end_date)
        .await?;

    Ok(Json(json!({ "transactions": transactions })))
}

/// A route handler for copying the linked accounts' transactions into the user's transactions.
///
/// Transactions that were imported before are skipped.
pub async fn import_endpoint(
    State(state): State<BankLinkState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<BankTransactionsQuery>, QueryRejection>,
) -> Result<Json<ImportSummary>, Error> {
    let Query(query) = query?;
    let (start_date, end_date) = query.range(local_today(&state.local_timezone)?)?;
    let client = client(&state)?;
    let access_token = access_token(&state, user_id)?;

    let bank_transactions = client
        .get_transactions(&access_token, start_date, end_date)
        .await?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    import_bank_transactions(user_id, &bank_transactions, &connection).map(Json)
}

/// A route handler for unlinking the user's bank.
///
/// Revokes the access token with the provider and then forgets it.
pub async fn disconnect_endpoint(
    State(state): State<BankLinkState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, Error> {
    let client = client(&state)?;
    let access_token = access_token(&state, user_id)?;

    client.remove_item(&access_token).await?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    delete_bank_link(user_id, &connection)?;

    Ok(Json(json!({ "message": "Bank account disconnected" })))
}
