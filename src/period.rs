//! Resolves symbolic periods ("week", "month", ...) into concrete date ranges.

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::dates;

/// A half-open range of dates, `start <= date < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// The first date in the range.
    #[serde(with = "dates::iso_date")]
    pub start: Date,
    /// The first date after the range.
    #[serde(with = "dates::iso_date")]
    pub end: Date,
}

impl DateRange {
    /// Create a range from inclusive start and end dates.
    ///
    /// Returns `None` if `last` is the latest representable date, since the
    /// day after it cannot be the end of the range.
    pub fn inclusive(start: Date, last: Date) -> Option<Self> {
        Some(Self {
            start,
            end: last.next_day()?,
        })
    }

    /// Whether `date` falls in the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }

    /// The last date in the range.
    pub fn last(&self) -> Date {
        self.end.previous_day().unwrap_or(self.start)
    }
}

/// A calendar period that can be resolved relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Parse a report period from a query string value.
    ///
    /// Reports accept "week", "month", "quarter" and "year". Anything else,
    /// including a missing value, falls back to [Period::Month].
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("week") => Self::Week,
            Some("quarter") => Self::Quarter,
            Some("year") => Self::Year,
            _ => Self::Month,
        }
    }

    /// The calendar range of this period that contains `today`.
    pub fn resolve(self, today: Date) -> DateRange {
        match self {
            Period::Day => DateRange {
                start: today,
                end: today + Duration::days(1),
            },
            Period::Week => week_range(today),
            Period::Month => {
                let start = first_of_month(today);
                DateRange {
                    start,
                    end: add_months(start, 1),
                }
            }
            Period::Quarter => {
                let mut start = first_of_month(today);
                for _ in 0..(today.month() as u8 - 1) % 3 {
                    start = first_of_month(start - Duration::days(1));
                }
                DateRange {
                    start,
                    end: add_months(start, 3),
                }
            }
            Period::Year => {
                let start = today - Duration::days(today.ordinal() as i64 - 1);
                DateRange {
                    start,
                    end: add_months(start, 12),
                }
            }
        }
    }
}

/// Weeks start on Monday.
fn week_range(today: Date) -> DateRange {
    let weekday_number = today.weekday().number_from_monday() as i64;
    let start = today - Duration::days(weekday_number - 1);

    DateRange {
        start,
        end: start + Duration::days(7),
    }
}

fn first_of_month(date: Date) -> Date {
    date - Duration::days(date.day() as i64 - 1)
}

/// Add `months` to a date that falls on the first of a month.
fn add_months(first_of_month_date: Date, months: u8) -> Date {
    // Every month has at most 31 days, so 31 days after the first lands in the next month.
    (0..months).fold(first_of_month_date, |date, _| {
        first_of_month(date + Duration::days(31))
    })
}
