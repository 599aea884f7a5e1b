//! Application router configuration with public and authenticated route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{
    AppState,
    alert::{delete_alert_endpoint, list_alerts_endpoint},
    auth::{log_in, sign_up},
    bank_link::{
        balances_endpoint, bank_transactions_endpoint, disconnect_endpoint,
        exchange_public_token_endpoint, import_endpoint,
    },
    budget::{
        active_budgets_endpoint, budget_progress_endpoint, create_budget_endpoint,
        delete_budget_endpoint, get_budget_endpoint, list_budgets_endpoint,
        update_budget_endpoint,
    },
    currency::get_exchange_rate_endpoint,
    endpoints,
    report::{
        category_spending_endpoint, create_report_endpoint, delete_report_endpoint,
        export_report_endpoint, get_report_endpoint, income_vs_expenses_endpoint,
        list_reports_endpoint, monthly_trend_endpoint, savings_rate_endpoint, summary_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions_endpoint,
        get_transaction_endpoint, list_transactions_endpoint, recent_transactions_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Authenticated routes reject requests without a valid bearer token through
/// the [crate::auth::AuthUser] extractor.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::LOG_IN, post(log_in));

    let transaction_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::RECENT_TRANSACTIONS,
            get(recent_transactions_endpoint),
        )
        .route(
            endpoints::EXPORT_TRANSACTIONS,
            get(export_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        );

    let budget_routes = Router::new()
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(endpoints::ACTIVE_BUDGETS, get(active_budgets_endpoint))
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(endpoints::BUDGET_PROGRESS, get(budget_progress_endpoint));

    let report_routes = Router::new()
        .route(
            endpoints::INCOME_VS_EXPENSES,
            get(income_vs_expenses_endpoint),
        )
        .route(endpoints::CATEGORY_SPENDING, get(category_spending_endpoint))
        .route(endpoints::MONTHLY_TREND, get(monthly_trend_endpoint))
        .route(endpoints::SAVINGS_RATE, get(savings_rate_endpoint))
        .route(endpoints::REPORT_SUMMARY, get(summary_endpoint))
        .route(endpoints::EXPORT_REPORT, get(export_report_endpoint))
        .route(
            endpoints::REPORTS,
            get(list_reports_endpoint).post(create_report_endpoint),
        )
        .route(
            endpoints::REPORT,
            get(get_report_endpoint).delete(delete_report_endpoint),
        );

    let bank_link_routes = Router::new()
        .route(
            endpoints::BANK_LINK_EXCHANGE_TOKEN,
            post(exchange_public_token_endpoint),
        )
        .route(endpoints::BANK_LINK_BALANCES, get(balances_endpoint))
        .route(
            endpoints::BANK_LINK_TRANSACTIONS,
            get(bank_transactions_endpoint),
        )
        .route(endpoints::BANK_LINK_IMPORT, post(import_endpoint))
        .route(endpoints::BANK_LINK_DISCONNECT, delete(disconnect_endpoint));

    let protected_routes = Router::new()
        .merge(transaction_routes)
        .merge(budget_routes)
        .merge(report_routes)
        .merge(bank_link_routes)
        .route(endpoints::ALERTS, get(list_alerts_endpoint))
        .route(endpoints::ALERT, delete(delete_alert_endpoint))
        .route(endpoints::CURRENCY, get(get_exchange_rate_endpoint));

    protected_routes
        .merge(public_routes)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
        .into_response()
}
