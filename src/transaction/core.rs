//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    dates,
    db::impl_sql_text,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The accepted string values.
    pub const NAMES: &[&str] = &["income", "expense"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {s}")),
        }
    }
}

impl_sql_text!(TransactionType);

/// What a transaction or budget was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transportation,
    Housing,
    Utilities,
    Entertainment,
    Shopping,
    Healthcare,
    Education,
    Savings,
    Investment,
    Salary,
    Other,
}

impl Category {
    /// The accepted string values.
    pub const NAMES: &[&str] = &[
        "food",
        "transportation",
        "housing",
        "utilities",
        "entertainment",
        "shopping",
        "healthcare",
        "education",
        "savings",
        "investment",
        "salary",
        "other",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transportation => "transportation",
            Self::Housing => "housing",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Savings => "savings",
            Self::Investment => "investment",
            Self::Salary => "salary",
            Self::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(Self::Food),
            "transportation" => Ok(Self::Transportation),
            "housing" => Ok(Self::Housing),
            "utilities" => Ok(Self::Utilities),
            "entertainment" => Ok(Self::Entertainment),
            "shopping" => Ok(Self::Shopping),
            "healthcare" => Ok(Self::Healthcare),
            "education" => Ok(Self::Education),
            "savings" => Ok(Self::Savings),
            "investment" => Ok(Self::Investment),
            "salary" => Ok(Self::Salary),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {s}")),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl_sql_text!(Category);

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    /// The accepted string values.
    pub const NAMES: &[&str] = &["cash", "credit_card", "debit_card", "bank_transfer", "other"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "bank_transfer" => Ok(Self::BankTransfer),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {s}")),
        }
    }
}

impl_sql_text!(PaymentMethod);

/// Whether a transaction has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    /// The accepted string values.
    pub const NAMES: &[&str] = &["pending", "completed", "failed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown transaction status: {s}")),
        }
    }
}

impl_sql_text!(TransactionStatus);

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned, never negative.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// What the money was for.
    pub category: Category,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "dates::iso_date")]
    pub date: Date,
    /// Three letter ISO 4217 currency code.
    pub currency: String,
    /// How the transaction was paid.
    pub payment_method: PaymentMethod,
    /// Whether the transaction has settled.
    pub status: TransactionStatus,
    /// The bank-link provider's ID for imported transactions.
    pub external_id: Option<String>,
    /// Free-form labels, trimmed and without blanks.
    pub tags: Vec<String>,
    /// Where the transaction happened.
    pub location: Option<String>,
    /// A link to an image or document of the receipt.
    pub receipt: Option<String>,
    /// When the transaction was recorded.
    #[serde(with = "dates::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: f64,
        category: Category,
        date: Date,
    ) -> NewTransaction {
        NewTransaction {
            amount,
            transaction_type,
            category,
            description: String::new(),
            date,
            currency: "USD".to_owned(),
            payment_method: PaymentMethod::Other,
            status: TransactionStatus::Completed,
            external_id: None,
            tags: Vec::new(),
            location: None,
            receipt: None,
        }
    }
}

/// The fields of a transaction that has not been saved yet.
///
/// Also used as the validated contents of a create or update request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: Category,
    pub description: String,
    pub date: Date,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub external_id: Option<String>,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub receipt: Option<String>,
}

impl NewTransaction {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the currency code for the transaction.
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_owned();
        self
    }

    /// Set the payment method for the transaction.
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Set the status for the transaction.
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the bank-link provider's ID for the transaction.
    pub fn external_id(mut self, external_id: Option<String>) -> Self {
        self.external_id = external_id;
        self
    }

    /// Set the tags for the transaction.
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| (*tag).to_owned()).collect();
        self
    }

    /// Set where the transaction happened.
    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    /// Set the link to the transaction's receipt.
    pub fn receipt(mut self, receipt: Option<String>) -> Self {
        self.receipt = receipt;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, amount, type, category, description, \
    date, currency, payment_method, status, external_id, tags, location, receipt, created_at";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                type TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                currency TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                status TEXT NOT NULL,
                external_id TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                location TEXT,
                receipt TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, external_id),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_category ON \"transaction\"(user_id, category);",
        (),
    )?;

    Ok(())
}

/// Create a new transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateExternalId] if `user_id` already has a transaction with the same external ID,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tags = tags_to_json(&new_transaction.tags)?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, amount, type, category, description, date, \
                currency, payment_method, status, external_id, tags, location, receipt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_one(
            params![
                user_id,
                new_transaction.amount,
                new_transaction.transaction_type,
                new_transaction.category,
                new_transaction.description,
                new_transaction.date,
                new_transaction.currency,
                new_transaction.payment_method,
                new_transaction.status,
                new_transaction.external_id,
                tags,
                new_transaction.location,
                new_transaction.receipt,
                dates::now_utc(),
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one(params![id, user_id], map_transaction_row)?;

    Ok(transaction)
}

/// Replace every editable field of transaction `id` owned by `user_id`.
///
/// The external ID and creation time are kept.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tags = tags_to_json(&transaction.tags)?;

    let updated = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
            SET \
                amount = ?1, \
                type = ?2, \
                category = ?3, \
                description = ?4, \
                date = ?5, \
                currency = ?6, \
                payment_method = ?7, \
                status = ?8, \
                tags = ?9, \
                location = ?10, \
                receipt = ?11 \
            WHERE id = ?12 AND user_id = ?13
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_one(
            params![
                transaction.amount,
                transaction.transaction_type,
                transaction.category,
                transaction.description,
                transaction.date,
                transaction.currency,
                transaction.payment_method,
                transaction.status,
                tags,
                transaction.location,
                transaction.receipt,
                id,
                user_id,
            ],
            map_transaction_row,
        )?;

    Ok(updated)
}

/// Delete transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Map a database row to a Transaction.
///
/// The row must have the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let tags: String = row.get(11)?;
    let tags = serde_json::from_str(&tags)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        transaction_type: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        currency: row.get(7)?,
        payment_method: row.get(8)?,
        status: row.get(9)?,
        external_id: row.get(10)?,
        tags,
        location: row.get(12)?,
        receipt: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Tags are stored as a JSON array of strings.
fn tags_to_json(tags: &[String]) -> Result<String, Error> {
    serde_json::to_string(tags).map_err(|error| Error::JSONSerializationError(error.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
