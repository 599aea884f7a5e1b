//! Resolves the date range that a report covers.

use serde::Deserialize;
use time::Date;

use crate::{
    Error, dates,
    period::{DateRange, Period},
    validation::Validator,
};

/// The query string accepted by the report endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub period: Option<String>,
    #[serde(default, with = "dates::option_iso_date")]
    pub start_date: Option<Date>,
    /// The last date to include.
    #[serde(default, with = "dates::option_iso_date")]
    pub end_date: Option<Date>,
}

impl ReportQuery {
    /// The range of dates to report on.
    ///
    /// A `startDate` and `endDate` pair selects a custom range and takes
    /// precedence over `period`. Otherwise `period` is resolved relative to
    /// `today`, defaulting to the current month.
    ///
    /// # Errors
    /// Returns [Error::Validation] if only one of the dates is given or they are out of order.
    pub fn resolve(&self, today: Date) -> Result<DateRange, Error> {
        custom_or_else(self.start_date, self.end_date, || {
            Period::from_query(self.period.as_deref()).resolve(today)
        })
    }
}

/// Use the inclusive `start_date` to `end_date` range if both are given,
/// otherwise the range from `default`.
///
/// # Errors
/// Returns [Error::Validation] if only one of the dates is given, they are out of order,
/// or `end_date` is the latest representable date.
pub(crate) fn custom_or_else(
    start_date: Option<Date>,
    end_date: Option<Date>,
    default: impl FnOnce() -> DateRange,
) -> Result<DateRange, Error> {
    let mut validator = Validator::new();

    let range = match (start_date, end_date) {
        (Some(start), Some(end)) => {
            validator.check(start <= end, "endDate", "endDate must not be before startDate");
            let range = DateRange::inclusive(start, end);
            validator.check(range.is_some(), "endDate", "endDate is out of range");
            range
        }
        (Some(_), None) => {
            validator.push("endDate", "endDate is required when startDate is given");
            None
        }
        (None, Some(_)) => {
            validator.push("startDate", "startDate is required when endDate is given");
            None
        }
        (None, None) => Some(default()),
    };

    validator.finish()?;

    range.ok_or_else(|| Error::MalformedRequest("report range failed validation".to_owned()))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, FieldError, period::DateRange};

    use super::ReportQuery;

    const TODAY: time::Date = date!(2025 - 05 - 20);

    #[test]
    fn defaults_to_current_month() {
        let range = ReportQuery::default().resolve(TODAY).unwrap();

        assert_eq!(
            range,
            DateRange {
                start: date!(2025 - 05 - 01),
                end: date!(2025 - 06 - 01)
            }
        );
    }

    #[test]
    fn period_is_resolved_against_today() {
        let query = ReportQuery {
            period: Some("quarter".to_owned()),
            ..Default::default()
        };

        assert_eq!(query.resolve(TODAY).unwrap().start, date!(2025 - 04 - 01));
    }

    #[test]
    fn explicit_dates_are_inclusive_and_override_period() {
        let query = ReportQuery {
            period: Some("year".to_owned()),
            start_date: Some(date!(2025 - 01 - 01)),
            end_date: Some(date!(2025 - 01 - 31)),
        };

        assert_eq!(
            query.resolve(TODAY).unwrap(),
            DateRange {
                start: date!(2025 - 01 - 01),
                end: date!(2025 - 02 - 01)
            }
        );
    }

    #[test]
    fn one_date_without_the_other_is_rejected() {
        let query = ReportQuery {
            start_date: Some(date!(2025 - 01 - 01)),
            ..Default::default()
        };

        assert_eq!(
            query.resolve(TODAY),
            Err(Error::Validation(vec![FieldError::new(
                "endDate",
                "endDate is required when startDate is given"
            )]))
        );
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let query = ReportQuery {
            start_date: Some(date!(2025 - 02 - 01)),
            end_date: Some(date!(2025 - 01 - 01)),
            ..Default::default()
        };

        assert!(matches!(query.resolve(TODAY), Err(Error::Validation(_))));
    }

    #[test]
    fn end_date_at_the_end_of_time_is_rejected() {
        let query = ReportQuery {
            start_date: Some(date!(2025 - 01 - 01)),
            end_date: Some(time::Date::MAX),
            ..Default::default()
        };

        assert_eq!(
            query.resolve(TODAY),
            Err(Error::Validation(vec![FieldError::new(
                "endDate",
                "endDate is out of range"
            )]))
        );
    }
}
