//! Converts provider transactions into the user's transactions.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error, UserID,
    bank_link::client::BankTransaction,
    transaction::{
        Category, NewTransaction, PaymentMethod, Transaction, TransactionStatus, TransactionType,
        create_transaction,
    },
    validation::normalize_currency_code,
};

/// The outcome of importing provider transactions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// The transactions that were created.
    pub imported: Vec<Transaction>,
    /// The number of transactions that had already been imported.
    pub skipped: usize,
}

/// Map a provider transaction onto a new transaction.
///
/// The provider reports money leaving the account as a positive amount, so
/// positive amounts become expenses and the rest become income.
pub fn to_new_transaction(bank_transaction: &BankTransaction) -> NewTransaction {
    let (transaction_type, amount) = if bank_transaction.amount > 0.0 {
        (TransactionType::Expense, bank_transaction.amount)
    } else {
        (TransactionType::Income, bank_transaction.amount.abs())
    };

    let description = match bank_transaction.name.trim() {
        "" => "Bank transaction",
        name => name,
    };

    let currency = bank_transaction
        .iso_currency_code
        .as_deref()
        .and_then(normalize_currency_code)
        .unwrap_or_else(|| "USD".to_owned());

    let status = if bank_transaction.pending {
        TransactionStatus::Pending
    } else {
        TransactionStatus::Completed
    };

    Transaction::build(
        transaction_type,
        amount,
        Category::Other,
        bank_transaction.date,
    )
    .description(description)
    .currency(&currency)
    .payment_method(PaymentMethod::BankTransfer)
    .status(status)
    .external_id(Some(bank_transaction.transaction_id.clone()))
}

/// Save `bank_transactions` for `user_id`, skipping any that were imported before.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error other than a duplicate import.
pub fn import_bank_transactions(
    user_id: UserID,
    bank_transactions: &[BankTransaction],
    connection: &Connection,
) -> Result<ImportSummary, Error> {
    let mut summary = ImportSummary {
        imported: Vec::new(),
        skipped: 0,
    };

    for bank_transaction in bank_transactions {
        match create_transaction(user_id, &to_new_transaction(bank_transaction), connection) {
            Ok(transaction) => summary.imported.push(transaction),
            Err(Error::DuplicateExternalId) => summary.skipped += 1,
            Err(error) => return Err(error),
        }
    }

    tracing::info!(
        "Imported {} bank transactions for user {user_id}, skipped {}",
        summary.imported.len(),
        summary.skipped
    );

    Ok(summary)
}
