//! Route handlers that compute report figures on demand.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    Error, UserID,
    auth::AuthUser,
    dates::format_iso_date,
    period::DateRange,
    report::{
        ReportState,
        aggregation::{
            CategoryTotal, IncomeVsExpenses, MonthlyTotals, ReportSummary, category_spending,
            income_vs_expenses, monthly_trend, savings_rate, summarize,
        },
        range::ReportQuery,
    },
    timezone::local_today,
    transaction::{
        Transaction, TransactionFilter, csv_attachment, query_transactions,
        write_transactions_csv,
    },
};

/// Fetch the transactions that `query` selects for `user_id`, along with the resolved range.
fn report_transactions(
    state: &ReportState,
    user_id: UserID,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<(DateRange, Vec<Transaction>), Error> {
    let Query(query) = query?;
    let range = query.resolve(local_today(&state.local_timezone)?)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions =
        query_transactions(user_id, &TransactionFilter::in_range(range), None, &connection)?;

    Ok((range, transactions))
}

pub async fn income_vs_expenses_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<IncomeVsExpenses>, Error> {
    let (_, transactions) = report_transactions(&state, user_id, query)?;

    Ok(Json(income_vs_expenses(&transactions)))
}

pub async fn category_spending_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let (_, transactions) = report_transactions(&state, user_id, query)?;

    Ok(Json(category_spending(&transactions)))
}

pub async fn monthly_trend_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<Vec<MonthlyTotals>>, Error> {
    let (_, transactions) = report_transactions(&state, user_id, query)?;

    Ok(Json(monthly_trend(&transactions)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsRateResponse {
    income: f64,
    expenses: f64,
    savings_rate: f64,
}

pub async fn savings_rate_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<SavingsRateResponse>, Error> {
    let (_, transactions) = report_transactions(&state, user_id, query)?;
    let totals = income_vs_expenses(&transactions);

    Ok(Json(SavingsRateResponse {
        income: totals.income,
        expenses: totals.expenses,
        savings_rate: savings_rate(totals),
    }))
}

/// A route handler for the full summary of a range, as stored in report snapshots.
pub async fn summary_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<Value>, Error> {
    let (range, transactions) = report_transactions(&state, user_id, query)?;
    let summary: ReportSummary = summarize(&transactions);

    Ok(Json(json!({
        "startDate": format_iso_date(range.start),
        "endDate": format_iso_date(range.last()),
        "summary": summary,
    })))
}

/// A route handler for downloading the transactions in a report range as CSV.
pub async fn export_report_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let (range, transactions) = report_transactions(&state, user_id, query)?;
    let csv = write_transactions_csv(&transactions)?;
    let file_name = format!(
        "report-{}-to-{}.csv",
        format_iso_date(range.start),
        format_iso_date(range.last())
    );

    Ok(csv_attachment(csv, &file_name))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        test_utils::{
            auth_token_for, create_test_user, get_test_server_with_state, get_test_state,
            insert_transaction,
        },
        transaction::{Category, Transaction, TransactionType},
    };

    /// A server with January 2025 transactions for one user, and that user's token.
    fn server_with_january() -> (TestServer, String) {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let other_user = create_test_user(&state, "bob@example.com");
        for (transaction_type, category, amount, date) in [
            (TransactionType::Income, Category::Salary, 1000.0, date!(2025 - 01 - 01)),
            (TransactionType::Expense, Category::Food, 150.0, date!(2025 - 01 - 05)),
            (TransactionType::Expense, Category::Housing, 600.0, date!(2025 - 01 - 31)),
            (TransactionType::Expense, Category::Food, 50.0, date!(2025 - 01 - 20)),
            // Outside the range.
            (TransactionType::Expense, Category::Food, 999.0, date!(2025 - 02 - 01)),
        ] {
            insert_transaction(
                &state,
                user.id,
                Transaction::build(transaction_type, amount, category, date),
            );
        }
        insert_transaction(
            &state,
            other_user.id,
            Transaction::build(TransactionType::Expense, 5.0, Category::Food, date!(2025 - 01 - 10)),
        );
        let token = auth_token_for(&state, user.id);

        (get_test_server_with_state(state), token)
    }

    async fn get_january(server: &TestServer, token: &str, path: &str) -> axum_test::TestResponse {
        server
            .get(path)
            .add_query_param("startDate", "2025-01-01")
            .add_query_param("endDate", "2025-01-31")
            .authorization_bearer(token)
            .await
    }

    #[tokio::test]
    async fn income_vs_expenses_totals_range() {
        let (server, token) = server_with_january();

        let response = get_january(&server, &token, "/api/reports/income-vs-expenses").await;

        response.assert_status_ok();
        response.assert_json(&json!({"income": 1000.0, "expenses": 800.0}));
    }

    #[tokio::test]
    async fn category_spending_is_sorted() {
        let (server, token) = server_with_january();

        let response = get_january(&server, &token, "/api/reports/category-spending").await;

        response.assert_status_ok();
        response.assert_json(&json!([
            {"category": "housing", "amount": 600.0},
            {"category": "food", "amount": 200.0},
        ]));
    }

    #[tokio::test]
    async fn monthly_trend_groups_by_month() {
        let (server, token) = server_with_january();

        let response = get_january(&server, &token, "/api/reports/monthly-trend").await;

        response.assert_status_ok();
        response.assert_json(&json!([
            {"month": "2025-01", "income": 1000.0, "expenses": 800.0},
        ]));
    }

    #[tokio::test]
    async fn savings_rate_is_percentage_kept() {
        let (server, token) = server_with_january();

        let response = get_january(&server, &token, "/api/reports/savings-rate").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["savingsRate"], 20.0);
    }

    #[tokio::test]
    async fn summary_includes_breakdown() {
        let (server, token) = server_with_january();

        let response = get_january(&server, &token, "/api/reports/summary").await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["startDate"], "2025-01-01");
        assert_eq!(body["endDate"], "2025-01-31");
        assert_eq!(body["summary"]["netSavings"], 200.0);
        assert_eq!(body["summary"]["categoryBreakdown"][0]["percentage"], 75.0);
    }

    #[tokio::test]
    async fn export_serves_csv() {
        let (server, token) = server_with_january();

        let response = get_january(&server, &token, "/api/reports/export").await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "text/csv");
        assert_eq!(response.text().lines().count(), 5);
    }

    #[tokio::test]
    async fn half_open_date_pair_is_rejected() {
        let (server, token) = server_with_january();

        let response = server
            .get("/api/reports/summary")
            .add_query_param("startDate", "2025-01-01")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn end_date_at_the_end_of_time_is_rejected() {
        let (server, token) = server_with_january();

        for path in [
            "/api/reports/income-vs-expenses",
            "/api/reports/category-spending",
            "/api/reports/monthly-trend",
            "/api/reports/savings-rate",
            "/api/reports/summary",
            "/api/reports/export",
        ] {
            let response = server
                .get(path)
                .add_query_param("startDate", "2025-01-01")
                .add_query_param("endDate", "9999-12-31")
                .authorization_bearer(&token)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }
}
