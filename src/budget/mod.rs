//! Per-category spending caps over recurring periods.
//!
//! This module contains:
//! - The `Budget` model and its database functions
//! - The budget progress calculator
//! - Route handlers for the budget API

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;
mod progress;

pub use core::{
    AlertSettings, Budget, BudgetPeriod, BudgetStatus, NewBudget, create_budget,
    create_budget_table, get_active_budgets, get_budget,
};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::update_budget_endpoint;
pub use list_endpoint::{
    active_budgets_endpoint, budget_progress_endpoint, get_budget_endpoint, list_budgets_endpoint,
};
pub use progress::{BudgetProgress, budget_window, get_budget_progress, sum_expenses};

/// The state needed by the budget route handlers.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
