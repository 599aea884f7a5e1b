//! Aggregated reports over a user's transactions.
//!
//! Report figures are computed on demand from the transactions in a date
//! range. Snapshots of the summary can be saved and listed later.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod aggregate_endpoint;
mod aggregation;
mod range;
mod snapshot;

pub use aggregate_endpoint::{
    category_spending_endpoint, export_report_endpoint, income_vs_expenses_endpoint,
    monthly_trend_endpoint, savings_rate_endpoint, summary_endpoint,
};
pub use aggregation::{ReportSummary, summarize};
pub use snapshot::{
    Report, ReportType, create_report, create_report_endpoint, create_report_table,
    delete_report_endpoint, get_report_endpoint, list_reports_endpoint,
};

/// The state needed by the report route handlers.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
