use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    Error,
    auth::AuthUser,
    budget::{Budget, BudgetState, core::update_budget, form::BudgetForm},
    database_id::BudgetId,
};

/// A route handler for replacing a budget, responds with the updated budget.
pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<BudgetId>, PathRejection>,
    form: Result<Json<BudgetForm>, JsonRejection>,
) -> Result<Json<Budget>, Error> {
    let Path(budget_id) = path?;
    let Json(form) = form?;
    let budget = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_budget(budget_id, user_id, &budget, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        budget::{Budget, BudgetPeriod, BudgetStatus},
        test_utils::{
            auth_token_for, create_test_user, get_test_server_with_state, get_test_state,
            insert_budget,
        },
        transaction::Category,
    };

    fn replacement() -> serde_json::Value {
        json!({
            "category": "entertainment",
            "amount": 60,
            "period": "weekly",
            "startDate": "2025-02-01",
            "endDate": "2025-06-30",
            "status": "completed",
            "notes": "Cut back",
        })
    }

    #[tokio::test]
    async fn update_replaces_budget() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let budget = insert_budget(
            &state,
            user.id,
            Budget::build(Category::Food, 100.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01)),
        );
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .put(&format!("/api/budgets/{}", budget.id))
            .authorization_bearer(token)
            .json(&replacement())
            .await;

        response.assert_status_ok();
        let updated = response.json::<Budget>();
        assert_eq!(updated.id, budget.id);
        assert_eq!(updated.category, Category::Entertainment);
        assert_eq!(updated.period, BudgetPeriod::Weekly);
        assert_eq!(updated.end_date, Some(date!(2025 - 06 - 30)));
        assert_eq!(updated.status, BudgetStatus::Completed);
        assert_eq!(updated.notes.as_deref(), Some("Cut back"));
    }

    #[tokio::test]
    async fn update_other_users_budget_is_not_found() {
        let state = get_test_state();
        let owner = create_test_user(&state, "alice@example.com");
        let intruder = create_test_user(&state, "mallory@example.com");
        let budget = insert_budget(
            &state,
            owner.id,
            Budget::build(Category::Food, 100.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01)),
        );
        let token = auth_token_for(&state, intruder.id);
        let server = get_test_server_with_state(state);

        let response = server
            .put(&format!("/api/budgets/{}", budget.id))
            .authorization_bearer(token)
            .json(&replacement())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
