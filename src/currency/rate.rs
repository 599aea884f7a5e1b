//! Cached exchange rates.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, dates};

/// The exchange rate between two currencies at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub base_currency: String,
    pub target_currency: String,
    /// The number of units of the target currency that one unit of the base currency buys.
    pub exchange_rate: f64,
    #[serde(with = "dates::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Create the currency rate table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_currency_rate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS currency_rate (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                base_currency TEXT NOT NULL,
                target_currency TEXT NOT NULL,
                exchange_rate REAL NOT NULL,
                last_updated TEXT NOT NULL,
                UNIQUE(base_currency, target_currency)
                )",
        (),
    )?;

    Ok(())
}

/// Get the cached rate from `base` to `target` if it was updated within `max_age` of `now`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_cached_rate(
    base: &str,
    target: &str,
    max_age: Duration,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Option<CurrencyRate>, Error> {
    let rate = connection
        .prepare(
            "SELECT base_currency, target_currency, exchange_rate, last_updated
            FROM currency_rate WHERE base_currency = ?1 AND target_currency = ?2",
        )?
        .query_row(params![base, target], map_rate_row)
        .optional()?;

    Ok(rate.filter(|rate| now - rate.last_updated <= max_age))
}

/// Insert or replace the cached rate for the pair in `rate`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn save_rate(rate: &CurrencyRate, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO currency_rate (base_currency, target_currency, exchange_rate, last_updated)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(base_currency, target_currency)
        DO UPDATE SET exchange_rate = excluded.exchange_rate, last_updated = excluded.last_updated",
        params![
            rate.base_currency,
            rate.target_currency,
            rate.exchange_rate,
            rate.last_updated
        ],
    )?;

    Ok(())
}

fn map_rate_row(row: &Row) -> Result<CurrencyRate, rusqlite::Error> {
    Ok(CurrencyRate {
        base_currency: row.get(0)?,
        target_currency: row.get(1)?,
        exchange_rate: row.get(2)?,
        last_updated: row.get(3)?,
    })
}
