//! Saved report snapshots.
//!
//! A snapshot stores the summary of a date range at the time it was created.
//! It is a cache: the same summary can always be recomputed from the
//! transactions with [summarize].

use std::str::FromStr;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    auth::AuthUser,
    database_id::ReportId,
    dates,
    db::impl_sql_text,
    endpoints::{self, format_endpoint},
    period::{DateRange, Period},
    report::{
        ReportState,
        aggregation::{ReportSummary, summarize},
        range::custom_or_else,
    },
    timezone::local_today,
    transaction::{TransactionFilter, query_transactions},
    validation::Validator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl ReportType {
    /// The accepted string values.
    pub const NAMES: &[&str] = &["monthly", "quarterly", "yearly", "custom"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }

    /// The calendar period a report of this type covers, `None` for custom reports.
    fn period(&self) -> Option<Period> {
        match self {
            Self::Monthly => Some(Period::Month),
            Self::Quarterly => Some(Period::Quarter),
            Self::Yearly => Some(Period::Year),
            Self::Custom => None,
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown report type: {s}")),
        }
    }
}

impl_sql_text!(ReportType);

/// A saved summary of a user's finances over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserID,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    #[serde(with = "dates::iso_date")]
    pub start_date: Date,
    /// The last date included in the report.
    #[serde(with = "dates::iso_date")]
    pub end_date: Date,
    pub summary: ReportSummary,
    #[serde(with = "dates::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the report table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_report_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS report (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                summary TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_report_user_type_dates \
            ON report(user_id, type, start_date, end_date);",
        (),
    )?;

    Ok(())
}

/// Summarize the transactions of `user_id` in `range` and save the result.
///
/// # Errors
/// This function will return a:
/// - [Error::JSONSerializationError] if the summary cannot be serialized,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_report(
    user_id: UserID,
    report_type: ReportType,
    range: DateRange,
    connection: &Connection,
) -> Result<Report, Error> {
    let transactions =
        query_transactions(user_id, &TransactionFilter::in_range(range), None, connection)?;
    let summary = serde_json::to_string(&summarize(&transactions))
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let report = connection
        .prepare(
            "INSERT INTO report (user_id, type, start_date, end_date, summary, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, user_id, type, start_date, end_date, summary, created_at",
        )?
        .query_one(
            params![
                user_id,
                report_type,
                range.start,
                range.last(),
                summary,
                dates::now_utc()
            ],
            map_report_row,
        )?;

    Ok(report)
}

/// Retrieve report `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a report owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_report(id: ReportId, user_id: UserID, connection: &Connection) -> Result<Report, Error> {
    let report = connection
        .prepare(
            "SELECT id, user_id, type, start_date, end_date, summary, created_at
            FROM report WHERE id = ?1 AND user_id = ?2",
        )?
        .query_one(params![id, user_id], map_report_row)?;

    Ok(report)
}

/// Get the reports of `user_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_reports(user_id: UserID, connection: &Connection) -> Result<Vec<Report>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, type, start_date, end_date, summary, created_at
            FROM report WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )?
        .query_map(params![user_id], map_report_row)?
        .map(|report_result| report_result.map_err(Error::from))
        .collect()
}

/// Delete report `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a report owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_report(id: ReportId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM report WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn map_report_row(row: &Row) -> Result<Report, rusqlite::Error> {
    let summary: String = row.get(5)?;
    let summary = serde_json::from_str(&summary)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(Report {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        report_type: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        summary,
        created_at: row.get(6)?,
    })
}

/// The request body for saving a report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportForm {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    #[serde(default, with = "dates::option_iso_date")]
    pub start_date: Option<Date>,
    #[serde(default, with = "dates::option_iso_date")]
    pub end_date: Option<Date>,
}

impl ReportForm {
    /// Check the form and work out the report type and range.
    ///
    /// Custom reports need both dates. The other types cover the current
    /// calendar month, quarter or year unless both dates are given.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every invalid field.
    pub fn validate(self, today: Date) -> Result<(ReportType, DateRange), Error> {
        let mut validator = Validator::new();
        let report_type: Option<ReportType> =
            validator.require_one_of("type", self.report_type, ReportType::NAMES);

        if report_type == Some(ReportType::Custom) {
            validator.check(
                self.start_date.is_some(),
                "startDate",
                "startDate is required for custom reports",
            );
            validator.check(
                self.end_date.is_some(),
                "endDate",
                "endDate is required for custom reports",
            );
        }

        validator.finish()?;

        let Some(report_type) = report_type else {
            return Err(Error::MalformedRequest(
                "report fields failed validation".to_owned(),
            ));
        };

        let period = report_type.period().unwrap_or(Period::Month);
        let range = custom_or_else(self.start_date, self.end_date, || period.resolve(today))?;

        Ok((report_type, range))
    }
}

pub async fn list_reports_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Report>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_reports(user_id, &connection).map(Json)
}

/// A route handler for saving a report snapshot, responds with 201 and the saved report.
pub async fn create_report_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    form: Result<Json<ReportForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = form?;
    let (report_type, range) = form.validate(local_today(&state.local_timezone)?)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let report = create_report(user_id, report_type, range, &connection)?;

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format_endpoint(endpoints::REPORT, report.id))],
        Json(report),
    )
        .into_response())
}

pub async fn get_report_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<ReportId>, PathRejection>,
) -> Result<Json<Report>, Error> {
    let Path(report_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_report(report_id, user_id, &connection).map(Json)
}

pub async fn delete_report_endpoint(
    State(state): State<ReportState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<ReportId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let Path(report_id) = path?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_report(report_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Report deleted" })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        period::DateRange,
        report::aggregation::summarize,
        test_utils::{
            auth_token_for, create_test_user, get_test_connection, get_test_server_with_state,
            get_test_state, insert_test_user,
        },
        transaction::{
            Category, Transaction, TransactionFilter, TransactionType, create_transaction,
            query_transactions,
        },
    };

    use super::{
        Report, ReportForm, ReportType, create_report, delete_report, get_report, get_reports,
    };

    #[test]
    fn snapshot_summary_matches_recomputed_summary() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "owner@example.com");
        for (transaction_type, category, amount, date) in [
            (TransactionType::Income, Category::Salary, 500.0, date!(2025 - 04 - 01)),
            (TransactionType::Expense, Category::Food, 120.0, date!(2025 - 04 - 12)),
            (TransactionType::Expense, Category::Utilities, 80.0, date!(2025 - 06 - 30)),
            (TransactionType::Expense, Category::Food, 40.0, date!(2025 - 07 - 01)),
        ] {
            create_transaction(
                user_id,
                &Transaction::build(transaction_type, amount, category, date),
                &conn,
            )
            .unwrap();
        }
        let range = DateRange::inclusive(date!(2025 - 04 - 01), date!(2025 - 06 - 30)).unwrap();

        let report = create_report(user_id, ReportType::Quarterly, range, &conn).unwrap();

        let transactions =
            query_transactions(user_id, &TransactionFilter::in_range(range), None, &conn).unwrap();
        assert_eq!(report.summary, summarize(&transactions));
        assert_eq!(report.summary.total_expenses, 200.0);
        assert_eq!(report.start_date, date!(2025 - 04 - 01));
        assert_eq!(report.end_date, date!(2025 - 06 - 30));
        assert_eq!(get_report(report.id, user_id, &conn), Ok(report));
    }

    #[test]
    fn reports_are_scoped_to_owner() {
        let conn = get_test_connection();
        let owner = insert_test_user(&conn, "owner@example.com");
        let other_user = insert_test_user(&conn, "other@example.com");
        let range = DateRange::inclusive(date!(2025 - 01 - 01), date!(2025 - 01 - 31)).unwrap();
        let report = create_report(owner, ReportType::Custom, range, &conn).unwrap();

        assert_eq!(get_report(report.id, other_user, &conn), Err(Error::NotFound));
        assert_eq!(get_reports(other_user, &conn), Ok(vec![]));
        assert_eq!(delete_report(report.id, other_user, &conn), Err(Error::NotFound));
        assert_eq!(delete_report(report.id, owner, &conn), Ok(()));
    }

    #[test]
    fn non_custom_types_default_to_current_period() {
        let form = ReportForm {
            report_type: Some("yearly".to_owned()),
            ..Default::default()
        };

        let (report_type, range) = form.validate(date!(2025 - 08 - 08)).unwrap();

        assert_eq!(report_type, ReportType::Yearly);
        assert_eq!(range.start, date!(2025 - 01 - 01));
        assert_eq!(range.last(), date!(2025 - 12 - 31));
    }

    #[test]
    fn custom_reports_need_both_dates() {
        let form = ReportForm {
            report_type: Some("custom".to_owned()),
            start_date: Some(date!(2025 - 01 - 01)),
            end_date: None,
        };

        let Err(Error::Validation(errors)) = form.validate(date!(2025 - 08 - 08)) else {
            panic!("expected validation errors");
        };

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "endDate");
    }

    #[tokio::test]
    async fn create_then_get_report_through_api() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .post("/api/reports")
            .authorization_bearer(token.clone())
            .json(&json!({
                "type": "custom",
                "startDate": "2025-01-01",
                "endDate": "2025-03-31",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let report = response.json::<Report>();
        assert_eq!(report.report_type, ReportType::Custom);
        assert_eq!(report.summary.total_income, 0.0);

        let response = server
            .get(&format!("/api/reports/{}", report.id))
            .authorization_bearer(token.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Report>(), report);

        let response = server.get("/api/reports").authorization_bearer(token).await;
        assert_eq!(response.json::<Vec<Report>>(), vec![report]);
    }

    #[tokio::test]
    async fn create_rejects_end_date_at_the_end_of_time() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .post("/api/reports")
            .authorization_bearer(token)
            .json(&json!({
                "type": "custom",
                "startDate": "2025-01-01",
                "endDate": "9999-12-31",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
