//! A REST API for tracking personal finances.
//!
//! Users record income and expense transactions, set per-category budgets,
//! view aggregated reports, look up exchange rates, and link a bank account
//! through a bank-data aggregation provider. Every endpoint speaks JSON.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod bank_link;
mod budget;
mod currency;
mod database_id;
mod dates;
mod db;
mod endpoints;
mod logging;
mod password;
mod period;
mod report;
mod routing;
mod timezone;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use bank_link::{BankLinkClient, BankLinkEnvironment};
pub use budget::{Budget, BudgetPeriod, NewBudget, create_budget};
pub use currency::ExchangeRateClient;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{
    Category, NewTransaction, PaymentMethod, Transaction, TransactionType, create_transaction,
};
pub use user::{User, UserID, create_user, get_user_by_email, update_password};
pub use validation::FieldError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in a request body or query failed validation.
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    /// The request body or query string could not be parsed.
    ///
    /// The string is the parser's explanation and is safe to show to the client.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Sign up was attempted with an email that already belongs to a user.
    #[error("a user with that email already exists")]
    DuplicateEmail,

    /// The email and password combination did not match a registered user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The request did not include a bearer token.
    #[error("missing bearer token")]
    MissingToken,

    /// The bearer token could not be decoded, has a bad signature, or has expired.
    #[error("invalid bearer token")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A signed token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The requested resource was not found.
    ///
    /// Resources that exist but belong to another user also produce this
    /// error so that clients cannot discover the existence of other users'
    /// records.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A transaction with the same external (bank-link provider) ID already exists.
    #[error("the external transaction ID already exists in the database")]
    DuplicateExternalId,

    /// A call to the bank-link or exchange rate provider failed.
    ///
    /// The first string names the provider, the second describes the failure.
    /// Neither is shown to the client.
    #[error("{0} request failed: {1}")]
    Upstream(&'static str, String),

    /// An optional provider was used but the server was started without its credentials.
    #[error("{0} is not configured")]
    ProviderNotConfigured(&'static str),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Transactions could not be written as CSV.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// A value could not be serialized as or parsed from JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067
                    && desc.ends_with("transaction.user_id, transaction.external_id") =>
            {
                Error::DuplicateExternalId
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::MalformedRequest(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
                    .into_response();
            }
            Error::MalformedRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            Error::DuplicateEmail => (StatusCode::BAD_REQUEST, "User already exists".to_owned()),
            Error::TooWeak(feedback) => (
                StatusCode::BAD_REQUEST,
                format!("Password is too weak: {feedback}"),
            ),
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_owned())
            }
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "No token, authorization denied".to_owned(),
            ),
            Error::InvalidToken => (StatusCode::UNAUTHORIZED, "Token is not valid".to_owned()),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested resource could not be found".to_owned(),
            ),
            Error::DuplicateExternalId => (
                StatusCode::BAD_REQUEST,
                "The transaction has already been imported".to_owned(),
            ),
            Error::Upstream(provider, reason) => {
                tracing::error!("{provider} request failed: {reason}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{provider} API error"),
                )
            }
            Error::ProviderNotConfigured(provider) => {
                tracing::error!(
                    "{provider} was called but the server was started without its credentials"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{provider} is unavailable"),
                )
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
