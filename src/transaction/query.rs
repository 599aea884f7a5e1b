//! Filtering and listing a user's transactions.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Deserialize;
use time::Date;

use crate::{
    Error, UserID,
    dates::{self, format_iso_date},
    period::{DateRange, Period},
    transaction::core::{
        Category, TRANSACTION_COLUMNS, Transaction, TransactionType, map_transaction_row,
    },
    validation::Validator,
};

/// The query string accepted when listing or exporting transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub period: Option<String>,
    #[serde(default, with = "dates::option_iso_date")]
    pub start_date: Option<Date>,
    #[serde(default, with = "dates::option_iso_date")]
    pub end_date: Option<Date>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

/// Conditions that a transaction must meet to be listed.
///
/// `None` fields do not filter anything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// The earliest date to include.
    pub start: Option<Date>,
    /// The first date to exclude.
    pub end: Option<Date>,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<Category>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl TransactionFilter {
    /// A filter that selects every transaction in `range`.
    pub fn in_range(range: DateRange) -> Self {
        Self {
            start: Some(range.start),
            end: Some(range.end),
            ..Default::default()
        }
    }
}

impl TransactionQuery {
    /// Check the query and convert it to a [TransactionFilter].
    ///
    /// Explicit `startDate`/`endDate` take precedence over `period`, and `endDate` is inclusive.
    /// `period` is resolved relative to `today`.
    ///
    /// # Errors
    /// Returns [Error::Validation] if an enum value is unknown, the dates are out of order,
    /// or `endDate` is the latest representable date.
    pub fn into_filter(self, today: Date) -> Result<TransactionFilter, Error> {
        let mut validator = Validator::new();

        let (start, end) = if self.start_date.is_some() || self.end_date.is_some() {
            if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
                validator.check(start <= end, "endDate", "endDate must not be before startDate");
            }

            let end = match self.end_date {
                Some(end_date) => {
                    let end = end_date.next_day();
                    validator.check(end.is_some(), "endDate", "endDate is out of range");
                    end
                }
                None => None,
            };

            (self.start_date, end)
        } else if self.period.is_some() {
            let range = Period::from_query(self.period.as_deref()).resolve(today);
            (Some(range.start), Some(range.end))
        } else {
            (None, None)
        };

        let transaction_type = match self.transaction_type {
            Some(value) => validator.require_one_of("type", Some(value), TransactionType::NAMES),
            None => None,
        };
        let category = match self.category {
            Some(value) => validator.require_one_of("category", Some(value), Category::NAMES),
            None => None,
        };

        validator.finish()?;

        Ok(TransactionFilter {
            start,
            end,
            transaction_type,
            category,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        })
    }
}

/// Get the transactions of `user_id` that match `filter`, newest first.
///
/// At most `limit` transactions are returned if it is given.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut conditions = vec!["user_id = ?".to_owned()];
    let mut values = vec![Value::Integer(user_id.as_i64())];

    if let Some(start) = filter.start {
        conditions.push("date >= ?".to_owned());
        values.push(Value::Text(format_iso_date(start)));
    }
    if let Some(end) = filter.end {
        conditions.push("date < ?".to_owned());
        values.push(Value::Text(format_iso_date(end)));
    }
    if let Some(transaction_type) = filter.transaction_type {
        conditions.push("type = ?".to_owned());
        values.push(Value::Text(transaction_type.as_str().to_owned()));
    }
    if let Some(category) = filter.category {
        conditions.push("category = ?".to_owned());
        values.push(Value::Text(category.as_str().to_owned()));
    }
    if let Some(min_amount) = filter.min_amount {
        conditions.push("amount >= ?".to_owned());
        values.push(Value::Real(min_amount));
    }
    if let Some(max_amount) = filter.max_amount {
        conditions.push("amount <= ?".to_owned());
        values.push(Value::Real(max_amount));
    }

    let limit_clause = match limit {
        Some(limit) => format!(" LIMIT {limit}"),
        None => String::new(),
    };

    // Sort by date, and then ID so that transactions on the same day keep a stable order.
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {} \
        ORDER BY date DESC, id DESC{limit_clause}",
        conditions.join(" AND ")
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(values), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}
