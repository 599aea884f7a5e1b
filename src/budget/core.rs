//! Defines the budget model and its database queries.

use std::str::FromStr;

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    database_id::BudgetId,
    dates,
    db::impl_sql_text,
    period::Period,
    transaction::Category,
};

/// How often a budget's spending cap resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    /// The accepted string values.
    pub const NAMES: &[&str] = &["daily", "weekly", "monthly", "yearly"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// The calendar period that a budget's spending is measured over.
    pub fn period(&self) -> Period {
        match self {
            Self::Daily => Period::Day,
            Self::Weekly => Period::Week,
            Self::Monthly => Period::Month,
            Self::Yearly => Period::Year,
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown budget period: {s}")),
        }
    }
}

impl_sql_text!(BudgetPeriod);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Active,
    Completed,
    Cancelled,
}

impl BudgetStatus {
    /// The accepted string values.
    pub const NAMES: &[&str] = &["active", "completed", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown budget status: {s}")),
        }
    }
}

impl_sql_text!(BudgetStatus);

/// When to warn the user about spending against a budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Whether alerts are raised at all.
    pub enabled: bool,
    /// The percentage of the budget, 0 to 100, at which to raise an alert.
    pub threshold: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 80.0,
        }
    }
}

/// A spending cap for one category over a recurring period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category: Category,
    /// The most that should be spent in each period.
    pub amount: f64,
    pub period: BudgetPeriod,
    #[serde(with = "dates::iso_date")]
    pub start_date: Date,
    /// The last day the budget applies, `None` for open-ended budgets.
    #[serde(with = "dates::option_iso_date")]
    pub end_date: Option<Date>,
    pub description: Option<String>,
    pub currency: String,
    pub alerts: AlertSettings,
    pub status: BudgetStatus,
    pub notes: Option<String>,
    #[serde(with = "dates::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "dates::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Budget {
    /// Create a new budget.
    ///
    /// Shortcut for [NewBudget] for discoverability.
    pub fn build(
        category: Category,
        amount: f64,
        period: BudgetPeriod,
        start_date: Date,
    ) -> NewBudget {
        NewBudget {
            category,
            amount,
            period,
            start_date,
            end_date: None,
            description: None,
            currency: "USD".to_owned(),
            alerts: AlertSettings::default(),
            status: BudgetStatus::Active,
            notes: None,
        }
    }

    /// Whether the budget applies on `today`.
    pub fn is_active(&self, today: Date) -> bool {
        self.status == BudgetStatus::Active
            && self.start_date <= today
            && self.end_date.is_none_or(|end_date| today <= end_date)
    }
}

/// The fields of a budget that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category: Category,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub description: Option<String>,
    pub currency: String,
    pub alerts: AlertSettings,
    pub status: BudgetStatus,
    pub notes: Option<String>,
}

impl NewBudget {
    /// Set the last day of the budget.
    pub fn end_date(mut self, end_date: Option<Date>) -> Self {
        self.end_date = end_date;
        self
    }

    /// Set the alert settings of the budget.
    pub fn alerts(mut self, alerts: AlertSettings) -> Self {
        self.alerts = alerts;
        self
    }

    /// Set the status of the budget.
    pub fn status(mut self, status: BudgetStatus) -> Self {
        self.status = status;
        self
    }
}

const BUDGET_COLUMNS: &str = "id, user_id, category, amount, period, start_date, end_date, \
    description, currency, alerts_enabled, alert_threshold, status, notes, created_at, updated_at";

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                period TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                description TEXT,
                currency TEXT NOT NULL,
                alerts_enabled INTEGER NOT NULL,
                alert_threshold REAL NOT NULL CHECK (alert_threshold BETWEEN 0 AND 100),
                status TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_user_category ON budget(user_id, category);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_user_dates ON budget(user_id, start_date, end_date);",
        (),
    )?;

    Ok(())
}

/// Create a new budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_budget(
    user_id: UserID,
    budget: &NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let now = dates::now_utc();

    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget (user_id, category, amount, period, start_date, end_date, \
                description, currency, alerts_enabled, alert_threshold, status, notes, \
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_one(
            params![
                user_id,
                budget.category,
                budget.amount,
                budget.period,
                budget.start_date,
                budget.end_date,
                budget.description,
                budget.currency,
                budget.alerts.enabled,
                budget.alerts.threshold,
                budget.status,
                budget.notes,
                now,
            ],
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve budget `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one(params![id, user_id], map_budget_row)?;

    Ok(budget)
}

/// Get all budgets of `user_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(params![user_id], map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::from))
        .collect()
}

/// Get the budgets of `user_id` that apply on `today`.
///
/// A budget applies if its status is active and `today` is between its
/// start and end dates, inclusive. Budgets without an end date never expire.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_active_budgets(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget \
            WHERE user_id = ?1 AND status = ?2 AND start_date <= ?3 \
                AND (end_date IS NULL OR end_date >= ?3) \
            ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(
            params![user_id, BudgetStatus::Active, today],
            map_budget_row,
        )?
        .map(|budget_result| budget_result.map_err(Error::from))
        .collect()
}

/// Replace every editable field of budget `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget(
    id: BudgetId,
    user_id: UserID,
    budget: &NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "UPDATE budget
            SET \
                category = ?1, \
                amount = ?2, \
                period = ?3, \
                start_date = ?4, \
                end_date = ?5, \
                description = ?6, \
                currency = ?7, \
                alerts_enabled = ?8, \
                alert_threshold = ?9, \
                status = ?10, \
                notes = ?11, \
                updated_at = ?12 \
            WHERE id = ?13 AND user_id = ?14
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_one(
            params![
                budget.category,
                budget.amount,
                budget.period,
                budget.start_date,
                budget.end_date,
                budget.description,
                budget.currency,
                budget.alerts.enabled,
                budget.alerts.threshold,
                budget.status,
                budget.notes,
                dates::now_utc(),
                id,
                user_id,
            ],
            map_budget_row,
        )?;

    Ok(budget)
}

/// Delete budget `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        amount: row.get(3)?,
        period: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        description: row.get(7)?,
        currency: row.get(8)?,
        alerts: AlertSettings {
            enabled: row.get(9)?,
            threshold: row.get(10)?,
        },
        status: row.get(11)?,
        notes: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, UserID,
        budget::core::{
            AlertSettings, Budget, BudgetPeriod, BudgetStatus, create_budget, delete_budget,
            get_active_budgets, get_budget, get_budgets, update_budget,
        },
        test_utils::{get_test_connection, insert_test_user},
        transaction::Category,
    };

    fn setup() -> (Connection, UserID) {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "owner@example.com");
        (conn, user_id)
    }

    #[test]
    fn create_then_get_gives_identical_budget() {
        let (conn, user_id) = setup();
        let created = create_budget(
            user_id,
            &Budget::build(Category::Food, 400.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01))
                .end_date(Some(date!(2025 - 12 - 31)))
                .alerts(AlertSettings {
                    enabled: false,
                    threshold: 50.0,
                }),
            &conn,
        )
        .unwrap();

        let retrieved = get_budget(created.id, user_id, &conn).unwrap();

        assert_eq!(created, retrieved);
        assert_eq!(retrieved.alerts.threshold, 50.0);
        assert!(!retrieved.alerts.enabled);
    }

    #[test]
    fn other_users_budgets_are_not_found() {
        let (conn, owner) = setup();
        let other_user = insert_test_user(&conn, "other@example.com");
        let new_budget =
            Budget::build(Category::Food, 400.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01));
        let budget = create_budget(owner, &new_budget, &conn).unwrap();

        assert_eq!(get_budget(budget.id, other_user, &conn), Err(Error::NotFound));
        assert_eq!(
            update_budget(budget.id, other_user, &new_budget, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(delete_budget(budget.id, other_user, &conn), Err(Error::NotFound));
        assert_eq!(get_budgets(other_user, &conn), Ok(vec![]));
    }

    #[test]
    fn update_replaces_fields() {
        let (conn, user_id) = setup();
        let budget = create_budget(
            user_id,
            &Budget::build(Category::Food, 400.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01)),
            &conn,
        )
        .unwrap();

        let updated = update_budget(
            budget.id,
            user_id,
            &Budget::build(Category::Shopping, 50.0, BudgetPeriod::Weekly, date!(2025 - 02 - 01))
                .status(BudgetStatus::Cancelled),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.id, budget.id);
        assert_eq!(updated.category, Category::Shopping);
        assert_eq!(updated.period, BudgetPeriod::Weekly);
        assert_eq!(updated.status, BudgetStatus::Cancelled);
        assert_eq!(updated.created_at, budget.created_at);
    }

    #[test]
    fn active_budgets_respect_status_and_dates() {
        let (conn, user_id) = setup();
        let today = date!(2025 - 06 - 15);
        let open_ended = create_budget(
            user_id,
            &Budget::build(Category::Food, 1.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01)),
            &conn,
        )
        .unwrap();
        let ends_today = create_budget(
            user_id,
            &Budget::build(Category::Food, 1.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01))
                .end_date(Some(today)),
            &conn,
        )
        .unwrap();
        // Expired, not started yet and cancelled budgets are excluded.
        for new_budget in [
            Budget::build(Category::Food, 1.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01))
                .end_date(Some(date!(2025 - 06 - 14))),
            Budget::build(Category::Food, 1.0, BudgetPeriod::Monthly, date!(2025 - 06 - 16)),
            Budget::build(Category::Food, 1.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01))
                .status(BudgetStatus::Cancelled),
        ] {
            create_budget(user_id, &new_budget, &conn).unwrap();
        }

        let active = get_active_budgets(user_id, today, &conn).unwrap();

        let mut ids: Vec<i64> = active.iter().map(|budget| budget.id).collect();
        ids.sort();
        assert_eq!(ids, vec![open_ended.id, ends_today.id]);
        assert!(active.iter().all(|budget| budget.is_active(today)));
    }

    #[test]
    fn delete_removes_budget() {
        let (conn, user_id) = setup();
        let budget = create_budget(
            user_id,
            &Budget::build(Category::Food, 400.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01)),
            &conn,
        )
        .unwrap();

        delete_budget(budget.id, user_id, &conn).unwrap();

        assert_eq!(get_budget(budget.id, user_id, &conn), Err(Error::NotFound));
    }
}
