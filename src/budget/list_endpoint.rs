//! Route handlers for reading budgets and their progress.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde::Serialize;

use crate::{
    Error,
    auth::AuthUser,
    budget::{
        Budget, BudgetState,
        core::{get_active_budgets, get_budget, get_budgets},
        progress::{BudgetProgress, get_budget_progress},
    },
    database_id::BudgetId,
    timezone::local_today,
};

/// A budget together with its spending in the current period.
#[derive(Debug, Serialize)]
pub struct BudgetWithProgress {
    #[serde(flatten)]
    pub budget: Budget,
    pub progress: BudgetProgress,
}

/// A route handler for listing the user's budgets, newest first.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budgets(user_id, &connection).map(Json)
}

/// A route handler for getting a single budget.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<BudgetId>, PathRejection>,
) -> Result<Json<Budget>, Error> {
    let Path(budget_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budget(budget_id, user_id, &connection).map(Json)
}

/// A route handler for listing the budgets that apply today along with their progress.
pub async fn active_budgets_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<BudgetWithProgress>>, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_active_budgets(user_id, today, &connection)?
        .into_iter()
        .map(|budget| {
            let progress = get_budget_progress(&budget, today, &connection)?;
            Ok(BudgetWithProgress { budget, progress })
        })
        .collect::<Result<Vec<_>, Error>>()
        .map(Json)
}

/// A route handler for getting the progress of a budget in its current period.
pub async fn budget_progress_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<BudgetId>, PathRejection>,
) -> Result<Json<BudgetProgress>, Error> {
    let Path(budget_id) = path?;
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, user_id, &connection)?;

    get_budget_progress(&budget, today, &connection).map(Json)
}
