//! Works out how much of a budget has been spent in its current period.

use rusqlite::{Connection, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error, UserID,
    budget::core::Budget,
    dates,
    period::DateRange,
    transaction::{Category, TransactionType},
};

/// Spending against a budget over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub spent: f64,
    /// The amount left before the cap is reached, negative if overspent.
    pub remaining: f64,
    /// `spent` as a percentage of the budget amount.
    pub percentage: f64,
    pub threshold_reached: bool,
    #[serde(with = "dates::iso_date")]
    pub period_start: Date,
    /// The first day after the period.
    #[serde(with = "dates::iso_date")]
    pub period_end: Date,
}

/// Calculate the progress of `budget` given the amount `spent` over `window`.
///
/// A zero amount budget reports a percentage of zero.
pub fn calculate_progress(budget: &Budget, spent: f64, window: DateRange) -> BudgetProgress {
    let percentage = if budget.amount > 0.0 {
        spent / budget.amount * 100.0
    } else {
        0.0
    };

    BudgetProgress {
        spent,
        remaining: budget.amount - spent,
        percentage,
        threshold_reached: budget.alerts.enabled
            && budget.amount > 0.0
            && percentage >= budget.alerts.threshold,
        period_start: window.start,
        period_end: window.end,
    }
}

/// The window of `budget`'s period that contains `today`.
pub fn budget_window(budget: &Budget, today: Date) -> DateRange {
    budget.period.period().resolve(today)
}

/// Sum the expenses of `user_id` in `category` dated within `range`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn sum_expenses(
    user_id: UserID,
    category: Category,
    range: DateRange,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" \
            WHERE user_id = ?1 AND type = ?2 AND category = ?3 AND date >= ?4 AND date < ?5",
        )?
        .query_one(
            params![
                user_id,
                TransactionType::Expense,
                category,
                range.start,
                range.end
            ],
            |row| row.get(0),
        )?;

    Ok(total)
}

/// Get the progress of `budget` for the period containing `today`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_budget_progress(
    budget: &Budget,
    today: Date,
    connection: &Connection,
) -> Result<BudgetProgress, Error> {
    let window = budget_window(budget, today);
    let spent = sum_expenses(budget.user_id, budget.category, window, connection)?;

    Ok(calculate_progress(budget, spent, window))
}
