use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::AuthUser,
    budget::{BudgetState, core::delete_budget},
    database_id::BudgetId,
};

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<BudgetId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let Path(budget_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget(budget_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Budget deleted" })))
}
