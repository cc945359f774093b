use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive instant range in UTC. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Normalize optional `YYYY-MM-DD` strings into
    /// `[start 00:00:00.000, end 23:59:59.999]` UTC. An empty string is the
    /// same as an omitted bound.
    pub fn from_days(
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let start_day = start_date
            .filter(|s| !s.is_empty())
            .map(|s| parse_day("start_date", s))
            .transpose()?;
        let end_day = end_date
            .filter(|s| !s.is_empty())
            .map(|s| parse_day("end_date", s))
            .transpose()?;

        if let (Some(start), Some(end)) = (start_day, end_day) {
            if start > end {
                return Err(ValidationError::InvertedRange {
                    start: start.format(DATE_FORMAT).to_string(),
                    end: end.format(DATE_FORMAT).to_string(),
                });
            }
        }

        Ok(Self {
            start: start_day.map(start_of_day),
            end: end_day.map(end_of_day),
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| instant >= start)
            && self.end.map_or(true, |end| instant <= end)
    }

    /// Bounds as the store expects them (RFC 3339, millisecond precision).
    pub fn start_rfc3339(&self) -> Option<String> {
        self.start
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn end_rfc3339(&self) -> Option<String> {
        self.end.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

fn parse_day(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    };

    // chrono accepts unpadded months and days; the wire format does not.
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(0, 0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc()
}
