//! Serde helpers for the date formats used in the JSON API.
//!
//! Dates are written as ISO 8601 calendar dates, e.g. "2025-01-15". Clients
//! often send full date-times (e.g. "2025-01-15T00:00:00.000Z"), so parsing
//! accepts either and keeps only the calendar date.

use time::{
    Date, OffsetDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

/// Calendar date format, e.g. "2025-01-15".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse an ISO 8601 date or date-time string into a calendar date.
///
/// Date-times are normalized to their date component without any timezone conversion.
pub fn parse_iso_date(text: &str) -> Result<Date, time::error::Parse> {
    let text = text.trim();
    let date_part = match text.find('T') {
        Some(position) => &text[..position],
        None => text,
    };

    Date::parse(date_part, DATE_FORMAT)
}

/// Format a date as "YYYY-MM-DD".
pub fn format_iso_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub mod iso_date {
    //! (De)serialize a [time::Date] as an ISO 8601 string.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_iso_date(&s).map_err(serde::de::Error::custom)
    }
}

pub mod option_iso_date {
    //! (De)serialize an optional [time::Date] as an ISO 8601 string or null.
    //!
    //! Empty strings deserialize to `None` since HTML forms and query strings
    //! send them for blank inputs.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_some(&super::format_iso_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;

        match s.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => super::parse_iso_date(text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

pub mod rfc3339 {
    //! (De)serialize a [time::OffsetDateTime] as an RFC 3339 string.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    use super::Rfc3339;

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

/// The current UTC time truncated to whole seconds.
///
/// Timestamps are stored in SQLite as text, truncating avoids sub-second noise
/// in API responses and makes stored values compare equal after a round trip.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}
