//! Parsing and display of CMS publication timestamps. Prismic reports
//! timestamps like `2021-03-25T19:25:28+0000` (no colon in the offset), which
//! isn't valid RFC 3339, so both forms are accepted.

use chrono::{DateTime, Datelike, FixedOffset, ParseResult, Timelike};
use serde::{Deserialize, Deserializer};

/// Timestamps are kept in the offset the CMS reported them in.
pub type Timestamp = DateTime<FixedOffset>;

const PRISMIC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

const PT_BR_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out",
    "nov", "dez",
];

/// Parses a CMS timestamp in either the Prismic (`+0000`) or RFC 3339 form.
pub fn parse(input: &str) -> ParseResult<Timestamp> {
    match DateTime::parse_from_str(input, PRISMIC_FORMAT) {
        Ok(timestamp) => Ok(timestamp),
        Err(_) => DateTime::parse_from_rfc3339(input),
    }
}

/// Formats the date portion as `dd MMM yyyy` with Brazilian Portuguese month
/// abbreviations, e.g. `25 mar 2021`.
pub fn format_date(timestamp: &Timestamp) -> String {
    format!(
        "{:02} {} {}",
        timestamp.day(),
        PT_BR_MONTHS[timestamp.month0() as usize],
        timestamp.year()
    )
}

/// Formats the time of day as unpadded `H:M`, e.g. `9:5`.
pub fn format_time(timestamp: &Timestamp) -> String {
    format!("{}:{}", timestamp.hour(), timestamp.minute())
}

/// A serde `deserialize_with` helper for nullable timestamp fields.
pub fn deserialize_opt<'de, D>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse(&s)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("timestamp `{}`: {}", s, e))),
    }
}
