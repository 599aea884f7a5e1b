//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/budgets/{budget_id}', use [format_endpoint].

/// The route for creating a new user.
pub const SIGN_UP: &str = "/api/auth/signup";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for the most recent transactions.
pub const RECENT_TRANSACTIONS: &str = "/api/transactions/recent";
/// The route to download transactions as CSV.
pub const EXPORT_TRANSACTIONS: &str = "/api/transactions/export";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route for the budgets that apply today, with their progress.
pub const ACTIVE_BUDGETS: &str = "/api/budgets/active";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for a budget's spending in its current period.
pub const BUDGET_PROGRESS: &str = "/api/budgets/{budget_id}/progress";

pub const INCOME_VS_EXPENSES: &str = "/api/reports/income-vs-expenses";
pub const CATEGORY_SPENDING: &str = "/api/reports/category-spending";
pub const MONTHLY_TREND: &str = "/api/reports/monthly-trend";
pub const SAVINGS_RATE: &str = "/api/reports/savings-rate";
pub const REPORT_SUMMARY: &str = "/api/reports/summary";
/// The route to download the transactions of a report range as CSV.
pub const EXPORT_REPORT: &str = "/api/reports/export";
/// The route to list and save report snapshots.
pub const REPORTS: &str = "/api/reports";
/// The route to access a single report snapshot.
pub const REPORT: &str = "/api/reports/{report_id}";

/// The route to list alerts.
pub const ALERTS: &str = "/api/alerts";
/// The route to dismiss an alert.
pub const ALERT: &str = "/api/alerts/{alert_id}";

/// The route for the exchange rate to a currency.
pub const CURRENCY: &str = "/api/currency/{code}";

/// The route for finishing the bank link flow.
pub const BANK_LINK_EXCHANGE_TOKEN: &str = "/api/plaid/exchange-public-token";
pub const BANK_LINK_BALANCES: &str = "/api/plaid/balances";
pub const BANK_LINK_TRANSACTIONS: &str = "/api/plaid/transactions";
/// The route for importing linked bank transactions.
pub const BANK_LINK_IMPORT: &str = "/api/plaid/import";
pub const BANK_LINK_DISCONNECT: &str = "/api/plaid/disconnect";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
