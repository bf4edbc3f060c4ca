use chrono::{NaiveDate, NaiveDateTime};

use crate::core::constants::{DATETIME_FORMAT, DATETIME_FORMATS, DATE_FORMAT, DATE_FORMATS};
use crate::error::{Result, RuvError};

/// Parse a timestamp in any of the accepted formats
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or_else(|| {
            RuvError::other(format!(
                "{} does not match any format: {:?}",
                s, DATETIME_FORMATS
            ))
        })
}

/// Parse a calendar date. Full timestamps are accepted too and truncated to the day.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| parse_datetime(s).ok().map(|dt| dt.date()))
        .ok_or_else(|| {
            RuvError::other(format!("{} does not match any format: {:?}", s, DATE_FORMATS))
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Serde adapter for `YYYY/MM/DD` dates
pub mod serde_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_date(&s).map_err(serde::de::Error::custom)
    }
}
