//! Stores the provider access token for each user's linked bank.

use rusqlite::{Connection, Row, params};
use time::OffsetDateTime;

use crate::{Error, UserID, dates};

/// A user's connection to the bank-link provider.
///
/// The access token never leaves the server.
#[derive(Debug, Clone, PartialEq)]
pub struct BankLink {
    pub user_id: UserID,
    pub access_token: String,
    pub item_id: String,
    pub created_at: OffsetDateTime,
}

pub fn create_bank_link_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bank_link (
                user_id INTEGER PRIMARY KEY,
                access_token TEXT NOT NULL,
                item_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Save the link for `user_id`, replacing any previous link.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn save_bank_link(
    user_id: UserID,
    access_token: &str,
    item_id: &str,
    connection: &Connection,
) -> Result<BankLink, Error> {
    let link = connection
        .prepare(
            "INSERT INTO bank_link (user_id, access_token, item_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token = excluded.access_token,
                item_id = excluded.item_id,
                created_at = excluded.created_at
            RETURNING user_id, access_token, item_id, created_at",
        )?
        .query_one(
            params![user_id, access_token, item_id, dates::now_utc()],
            map_bank_link_row,
        )?;

    Ok(link)
}

/// Get the link for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user has not linked a bank,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_bank_link(user_id: UserID, connection: &Connection) -> Result<BankLink, Error> {
    let link = connection
        .prepare(
            "SELECT user_id, access_token, item_id, created_at FROM bank_link WHERE user_id = ?1",
        )?
        .query_one(params![user_id], map_bank_link_row)?;

    Ok(link)
}

/// Remove the link for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user has not linked a bank,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_bank_link(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM bank_link WHERE user_id = ?1", params![user_id])?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn map_bank_link_row(row: &Row) -> Result<BankLink, rusqlite::Error> {
    Ok(BankLink {
        user_id: UserID::new(row.get(0)?),
        access_token: row.get(1)?,
        item_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}
