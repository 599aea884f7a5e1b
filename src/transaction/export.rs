//! Exporting transactions as CSV.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    auth::AuthUser,
    dates::format_iso_date,
    timezone::local_today,
    transaction::{
        Transaction, TransactionState,
        query::{TransactionQuery, query_transactions},
    },
};

/// The header row of exported CSV files.
const CSV_HEADER: [&str; 5] = ["Date", "Type", "Category", "Description", "Amount"];

/// Write `transactions` as CSV with a header row.
///
/// Fields containing commas, quotes or line breaks are quoted. Amounts are
/// written exactly as stored, without rounding.
///
/// # Errors
/// Returns [Error::CsvError] if the CSV could not be written.
pub fn write_transactions_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for transaction in transactions {
        writer
            .write_record([
                format_iso_date(transaction.date),
                transaction.transaction_type.as_str().to_owned(),
                transaction.category.as_str().to_owned(),
                transaction.description.clone(),
                transaction.amount.to_string(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}

/// Wrap CSV text in a response that browsers download as `file_name`.
pub fn csv_attachment(csv: String, file_name: &str) -> Response {
    (
        [
            (CONTENT_TYPE, "text/csv".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

/// A route handler for downloading the user's transactions as CSV.
///
/// Accepts the same filters as listing transactions.
pub async fn export_transactions_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;
    let filter = query.into_filter(local_today(&state.local_timezone)?)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        query_transactions(user_id, &filter, None, &connection)?
    };

    let csv = write_transactions_csv(&transactions)?;

    Ok(csv_attachment(csv, "transactions.csv"))
}
