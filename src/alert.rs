//! Budget alerts raised when spending crosses a budget's alert threshold.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    auth::AuthUser,
    budget::{Budget, budget_window, get_active_budgets, sum_expenses},
    database_id::{AlertId, BudgetId},
    dates,
    period::DateRange,
    transaction::{Transaction, TransactionType},
};

/// A message telling the user that they are close to or over a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub user_id: UserID,
    /// The budget that raised the alert, `None` if the budget has since been deleted.
    pub budget_id: Option<BudgetId>,
    pub message: String,
    #[serde(with = "dates::rfc3339")]
    pub date: OffsetDateTime,
}

/// The state needed by the alert route handlers.
#[derive(Debug, Clone)]
pub struct AlertState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AlertState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the alert table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_alert_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS alert (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                budget_id INTEGER,
                message TEXT NOT NULL,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(budget_id) REFERENCES budget(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_alert_user_date ON alert(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Save a new alert for `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_alert(
    user_id: UserID,
    budget_id: Option<BudgetId>,
    message: &str,
    connection: &Connection,
) -> Result<Alert, Error> {
    let alert = connection
        .prepare(
            "INSERT INTO alert (user_id, budget_id, message, date) VALUES (?1, ?2, ?3, ?4)
            RETURNING id, user_id, budget_id, message, date",
        )?
        .query_one(
            params![user_id, budget_id, message, dates::now_utc()],
            map_alert_row,
        )?;

    Ok(alert)
}

/// Get the alerts of `user_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_alerts(user_id: UserID, connection: &Connection) -> Result<Vec<Alert>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, budget_id, message, date FROM alert
            WHERE user_id = ?1 ORDER BY date DESC, id DESC",
        )?
        .query_map(params![user_id], map_alert_row)?
        .map(|alert_result| alert_result.map_err(Error::from))
        .collect()
}

/// Delete alert `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an alert owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_alert(id: AlertId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM alert WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn map_alert_row(row: &Row) -> Result<Alert, rusqlite::Error> {
    Ok(Alert {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        budget_id: row.get(2)?,
        message: row.get(3)?,
        date: row.get(4)?,
    })
}

/// Record an alert for every budget that `transaction` pushed over its alert threshold.
///
/// Only expenses count. A budget is checked if it is active on `today`, has
/// alerts enabled, has the same category as the transaction, and its current
/// period contains the transaction's date. An alert is raised only when the
/// spending was below the threshold before the transaction and at or above it
/// afterwards, so each period raises at most one alert per budget unless
/// spending is later reduced.
///
/// The transaction must already be saved. When an existing transaction was
/// edited, `previous` is its version from before the edit, so that only the
/// change in spending is counted.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn record_budget_alerts(
    user_id: UserID,
    transaction: &Transaction,
    previous: Option<&Transaction>,
    today: Date,
    connection: &Connection,
) -> Result<Vec<Alert>, Error> {
    if transaction.transaction_type != TransactionType::Expense {
        return Ok(Vec::new());
    }

    let mut alerts = Vec::new();

    for budget in get_active_budgets(user_id, today, connection)? {
        if !budget.alerts.enabled || budget.amount <= 0.0 || budget.category != transaction.category
        {
            continue;
        }

        let window = budget_window(&budget, today);
        if !window.contains(transaction.date) {
            continue;
        }

        let previous_amount =
            previous.map_or(0.0, |previous| spent_in(previous, &budget, window));
        let spent_after = sum_expenses(user_id, budget.category, window, connection)?;
        let spent_before = spent_after - transaction.amount + previous_amount;
        let percentage_after = spent_after / budget.amount * 100.0;
        let percentage_before = spent_before / budget.amount * 100.0;

        if percentage_before < budget.alerts.threshold
            && percentage_after >= budget.alerts.threshold
        {
            let message = alert_message(&budget, spent_after, percentage_after);
            tracing::info!("Budget {} crossed its alert threshold", budget.id);
            alerts.push(create_alert(user_id, Some(budget.id), &message, connection)?);
        }
    }

    Ok(alerts)
}

/// How much `transaction` adds to the spending of `budget` over `window`.
fn spent_in(transaction: &Transaction, budget: &Budget, window: DateRange) -> f64 {
    if transaction.transaction_type == TransactionType::Expense
        && transaction.category == budget.category
        && window.contains(transaction.date)
    {
        transaction.amount
    } else {
        0.0
    }
}

fn alert_message(budget: &Budget, spent: f64, percentage: f64) -> String {
    format!(
        "You have spent {percentage:.0}% of your {} {} budget ({spent:.2} of {:.2} {})",
        budget.period.as_str(),
        budget.category,
        budget.amount,
        budget.currency
    )
}

/// A route handler for listing the user's alerts, newest first.
pub async fn list_alerts_endpoint(
    State(state): State<AlertState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Alert>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_alerts(user_id, &connection).map(Json)
}

/// A route handler for dismissing an alert.
pub async fn delete_alert_endpoint(
    State(state): State<AlertState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<AlertId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let Path(alert_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_alert(alert_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Alert deleted" })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rusqlite::Connection;
    use serde_json::json;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error, UserID,
        budget::{AlertSettings, Budget, BudgetPeriod, create_budget},
        test_utils::{
            auth_token_for, create_test_user, get_test_connection, get_test_server_with_state,
            get_test_state, insert_test_user,
        },
        transaction::{
            Category, Transaction, TransactionType, create_transaction, update_transaction,
        },
    };

    use super::{Alert, create_alert, delete_alert, get_alerts, record_budget_alerts};

    const TODAY: time::Date = date!(2025 - 03 - 20);

    fn setup_budget(conn: &Connection, alerts: AlertSettings) -> UserID {
        let user_id = insert_test_user(conn, "owner@example.com");
        create_budget(
            user_id,
            &Budget::build(Category::Food, 100.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01))
                .alerts(alerts),
            conn,
        )
        .unwrap();
        user_id
    }

    fn spend(conn: &Connection, user_id: UserID, amount: f64, date: time::Date) -> Vec<Alert> {
        let transaction = create_transaction(
            user_id,
            &Transaction::build(TransactionType::Expense, amount, Category::Food, date),
            conn,
        )
        .unwrap();

        record_budget_alerts(user_id, &transaction, None, TODAY, conn).unwrap()
    }

    #[test]
    fn alert_raised_once_when_threshold_crossed() {
        let conn = get_test_connection();
        let user_id = setup_budget(&conn, AlertSettings::default());

        assert!(spend(&conn, user_id, 50.0, TODAY).is_empty());

        let alerts = spend(&conn, user_id, 35.0, TODAY);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("85%"), "{}", alerts[0].message);

        assert!(spend(&conn, user_id, 10.0, TODAY).is_empty());
        assert_eq!(get_alerts(user_id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn no_alert_when_alerts_disabled() {
        let conn = get_test_connection();
        let user_id = setup_budget(
            &conn,
            AlertSettings {
                enabled: false,
                threshold: 10.0,
            },
        );

        assert!(spend(&conn, user_id, 90.0, TODAY).is_empty());
    }

    #[test]
    fn no_alert_for_expense_outside_current_period() {
        let conn = get_test_connection();
        let user_id = setup_budget(&conn, AlertSettings::default());

        assert!(spend(&conn, user_id, 95.0, date!(2025 - 02 - 28)).is_empty());
    }

    #[test]
    fn edit_moving_expense_into_current_period_raises_alert() {
        let conn = get_test_connection();
        let user_id = setup_budget(&conn, AlertSettings::default());
        let previous = create_transaction(
            user_id,
            &Transaction::build(TransactionType::Expense, 90.0, Category::Food, date!(2025 - 02 - 28)),
            &conn,
        )
        .unwrap();
        let moved = update_transaction(
            previous.id,
            user_id,
            &Transaction::build(TransactionType::Expense, 90.0, Category::Food, TODAY),
            &conn,
        )
        .unwrap();

        let alerts = record_budget_alerts(user_id, &moved, Some(&previous), TODAY, &conn).unwrap();

        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn edit_within_period_counts_only_the_change() {
        let conn = get_test_connection();
        let user_id = setup_budget(&conn, AlertSettings::default());
        let previous = create_transaction(
            user_id,
            &Transaction::build(TransactionType::Expense, 85.0, Category::Food, TODAY),
            &conn,
        )
        .unwrap();
        let edited = update_transaction(
            previous.id,
            user_id,
            &Transaction::build(TransactionType::Expense, 88.0, Category::Food, TODAY),
            &conn,
        )
        .unwrap();

        let alerts = record_budget_alerts(user_id, &edited, Some(&previous), TODAY, &conn).unwrap();

        assert!(alerts.is_empty());
    }

    #[test]
    fn no_alert_for_income() {
        let conn = get_test_connection();
        let user_id = setup_budget(&conn, AlertSettings::default());
        let transaction = create_transaction(
            user_id,
            &Transaction::build(TransactionType::Income, 500.0, Category::Food, TODAY),
            &conn,
        )
        .unwrap();

        let alerts = record_budget_alerts(user_id, &transaction, None, TODAY, &conn).unwrap();

        assert!(alerts.is_empty());
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let conn = get_test_connection();
        let owner = insert_test_user(&conn, "owner@example.com");
        let other_user = insert_test_user(&conn, "other@example.com");
        let alert = create_alert(owner, None, "Heads up", &conn).unwrap();

        assert_eq!(delete_alert(alert.id, other_user, &conn), Err(Error::NotFound));
        assert_eq!(delete_alert(alert.id, owner, &conn), Ok(()));
        assert_eq!(get_alerts(owner, &conn), Ok(vec![]));
    }

    #[tokio::test]
    async fn creating_expense_through_api_records_alert() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let today = OffsetDateTime::now_utc().date();
        {
            let connection = state.db_connection.lock().unwrap();
            create_budget(
                user.id,
                &Budget::build(Category::Food, 100.0, BudgetPeriod::Yearly, today),
                &connection,
            )
            .unwrap();
        }
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        server
            .post("/api/transactions")
            .authorization_bearer(token.clone())
            .json(&json!({
                "amount": 99,
                "type": "expense",
                "category": "food",
                "description": "Feast",
                "paymentMethod": "cash",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/alerts").authorization_bearer(token.clone()).await;
        response.assert_status_ok();
        let alerts = response.json::<Vec<Alert>>();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].user_id, user.id);

        server
            .delete(&format!("/api/alerts/{}", alerts[0].id))
            .authorization_bearer(token.clone())
            .await
            .assert_status_ok();

        let response = server.get("/api/alerts").authorization_bearer(token).await;
        assert_eq!(response.json::<Vec<Alert>>(), vec![]);
    }
}
