//! Defines the endpoint for creating a new budget.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    auth::AuthUser,
    budget::{BudgetState, core::create_budget, form::BudgetForm},
    endpoints::{self, format_endpoint},
};

/// A route handler for creating a new budget, responds with 201 and the created budget.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    AuthUser(user_id): AuthUser,
    form: Result<Json<BudgetForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = form?;
    let new_budget = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(user_id, &new_budget, &connection)?;

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format_endpoint(endpoints::BUDGET, budget.id))],
        Json(budget),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        budget::{Budget, BudgetPeriod, BudgetStatus},
        test_utils::{auth_token_for, create_test_user, get_test_server_with_state, get_test_state},
        transaction::Category,
    };

    #[tokio::test]
    async fn create_returns_created_budget() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .post("/api/budgets")
            .authorization_bearer(token)
            .json(&json!({
                "category": "food",
                "amount": 400,
                "period": "monthly",
                "startDate": "2025-01-01",
                "alerts": {"threshold": 90},
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let budget = response.json::<Budget>();
        assert_eq!(budget.user_id, user.id);
        assert_eq!(budget.category, Category::Food);
        assert_eq!(budget.period, BudgetPeriod::Monthly);
        assert_eq!(budget.start_date, date!(2025 - 01 - 01));
        assert_eq!(budget.status, BudgetStatus::Active);
        assert!(budget.alerts.enabled);
        assert_eq!(budget.alerts.threshold, 90.0);
    }

    #[tokio::test]
    async fn create_lists_invalid_fields() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .post("/api/budgets")
            .authorization_bearer(token)
            .json(&json!({"category": "food", "amount": -1, "period": "hourly"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .expect("errors should be an array")
            .iter()
            .map(|error| error["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["amount", "period", "startDate"]);
    }
}
