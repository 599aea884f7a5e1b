//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    alert::create_alert_table, bank_link::create_bank_link_table, budget::create_budget_table,
    currency::create_currency_rate_table, report::create_report_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create all the tables for the domain models.
///
/// Safe to call on an existing database, tables that already exist are left alone.
///
/// # Errors
/// Returns an error if a table could not be created or the changes could not be committed.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_alert_table(&transaction)?;
    create_report_table(&transaction)?;
    create_currency_rate_table(&transaction)?;
    create_bank_link_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Implement [rusqlite::ToSql] and [rusqlite::types::FromSql] for an enum stored as text.
///
/// The enum must have an `as_str` method and implement [std::str::FromStr].
macro_rules! impl_sql_text {
    ($type:ty) => {
        impl rusqlite::ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $type {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|_| {
                    rusqlite::types::FromSqlError::Other(
                        format!("invalid {} value", stringify!($type)).into(),
                    )
                })
            }
        }
    };
}

pub(crate) use impl_sql_text;
