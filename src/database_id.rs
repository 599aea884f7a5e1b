//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
pub type TransactionId = i64;
pub type BudgetId = i64;
pub type ReportId = i64;
pub type AlertId = i64;
