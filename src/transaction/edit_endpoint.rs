use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    Error,
    alert::record_budget_alerts,
    auth::AuthUser,
    database_id::TransactionId,
    timezone::local_today,
    transaction::{
        Transaction, TransactionState,
        core::{get_transaction, update_transaction},
        form::TransactionForm,
    },
};

/// A route handler for replacing a transaction, responds with the updated transaction.
///
/// The request body is validated the same way as for creating a transaction.
/// An edit that pushes an alert-enabled budget over its threshold records an alert.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<TransactionId>, PathRejection>,
    form: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Path(transaction_id) = path?;
    let Json(form) = form?;
    let today = local_today(&state.local_timezone)?;
    let transaction = form.validate(today)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let previous = get_transaction(transaction_id, user_id, &connection)?;
    let updated = update_transaction(transaction_id, user_id, &transaction, &connection)?;

    if let Err(error) =
        record_budget_alerts(user_id, &updated, Some(&previous), today, &connection)
    {
        tracing::error!(
            "Could not check budget alerts for transaction {}: {error}",
            updated.id
        );
    }

    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        alert::Alert,
        budget::{Budget, BudgetPeriod},
        test_utils::{
            auth_token_for, create_test_user, get_test_server_with_state, get_test_state,
            insert_budget, insert_transaction,
        },
        transaction::{Category, Transaction, TransactionType},
    };

    fn replacement() -> serde_json::Value {
        json!({
            "amount": 80,
            "type": "expense",
            "category": "utilities",
            "description": "Power bill",
            "date": "2025-03-02",
            "paymentMethod": "bank_transfer",
        })
    }

    #[tokio::test]
    async fn update_replaces_transaction() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let created = insert_transaction(
            &state,
            user.id,
            Transaction::build(TransactionType::Expense, 9.99, Category::Food, date!(2025 - 03 - 01)),
        );
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(token)
            .json(&replacement())
            .await;

        response.assert_status_ok();
        let updated = response.json::<Transaction>();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 80.0);
        assert_eq!(updated.category, Category::Utilities);
        assert_eq!(updated.date, date!(2025 - 03 - 02));
    }

    #[tokio::test]
    async fn update_other_users_transaction_is_not_found() {
        let state = get_test_state();
        let owner = create_test_user(&state, "alice@example.com");
        let intruder = create_test_user(&state, "mallory@example.com");
        let created = insert_transaction(
            &state,
            owner.id,
            Transaction::build(TransactionType::Expense, 9.99, Category::Food, date!(2025 - 03 - 01)),
        );
        let token = auth_token_for(&state, intruder.id);
        let server = get_test_server_with_state(state);

        let response = server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(token)
            .json(&replacement())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_validates_like_create() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let created = insert_transaction(
            &state,
            user.id,
            Transaction::build(TransactionType::Expense, 9.99, Category::Food, date!(2025 - 03 - 01)),
        );
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(token)
            .json(&json!({"amount": -5}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_that_crosses_threshold_records_alert() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let today = OffsetDateTime::now_utc().date();
        insert_budget(
            &state,
            user.id,
            Budget::build(Category::Food, 100.0, BudgetPeriod::Yearly, today),
        );
        let created = insert_transaction(
            &state,
            user.id,
            Transaction::build(TransactionType::Expense, 50.0, Category::Food, today),
        );
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let edit = |amount: f64| {
            json!({
                "amount": amount,
                "type": "expense",
                "category": "food",
                "description": "Groceries",
                "paymentMethod": "cash",
            })
        };

        server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(token.clone())
            .json(&edit(60.0))
            .await
            .assert_status_ok();
        let response = server.get("/api/alerts").authorization_bearer(token.clone()).await;
        assert_eq!(response.json::<Vec<Alert>>(), vec![]);

        server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(token.clone())
            .json(&edit(90.0))
            .await
            .assert_status_ok();
        let response = server.get("/api/alerts").authorization_bearer(token.clone()).await;
        let alerts = response.json::<Vec<Alert>>();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("90%"), "{}", alerts[0].message);

        server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(token.clone())
            .json(&edit(95.0))
            .await
            .assert_status_ok();
        let response = server.get("/api/alerts").authorization_bearer(token).await;
        assert_eq!(response.json::<Vec<Alert>>().len(), 1);
    }
}
