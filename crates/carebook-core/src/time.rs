//! Time helpers shared by the record types.
//!
//! Timestamps travel as RFC 3339 strings. Calendar dates travel as `YYYY-MM-DD`.

use crate::error::{CoreError, Result};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK_HM: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]");
const CLOCK_HMS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]:[second]");
const PADDED_HM: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const PADDED_HMS: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp the way the backend stores it.
pub fn format_rfc3339(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value.trim(), ISO_DATE).map_err(|_| CoreError::InvalidDate(value.to_string()))
}

pub fn format_date(value: Date) -> String {
    value.format(ISO_DATE).unwrap_or_default()
}

/// Parses a wall-clock time written as `H:MM`, `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(value: &str) -> Result<Time> {
    let value = value.trim();
    Time::parse(value, CLOCK_HMS)
        .or_else(|_| Time::parse(value, CLOCK_HM))
        .map_err(|_| CoreError::InvalidTime(value.to_string()))
}

/// Rewrites a wall-clock time zero-padded so that text order is time order.
///
/// Seconds are kept only when the input carried them.
pub fn normalize_clock_time(value: &str) -> Result<String> {
    let parsed = parse_clock_time(value)?;
    let format = if value.trim().matches(':').count() == 2 {
        PADDED_HMS
    } else {
        PADDED_HM
    };
    parsed
        .format(format)
        .map_err(|_| CoreError::InvalidTime(value.to_string()))
}

/// Milliseconds since the Unix epoch, used to prefix storage keys.
pub fn unix_millis(value: OffsetDateTime) -> i128 {
    value.unix_timestamp_nanos() / 1_000_000
}

/// Serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_date(&s).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module for `Option<Date>`; `null` maps to `None`.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(date) => serializer.serialize_str(&super::super::format_date(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| super::super::parse_date(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
