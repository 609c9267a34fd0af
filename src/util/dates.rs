//! Date parts
//!
//! All conversions are in UTC. Unset parts are `-1`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::{UtilError, UtilResult};

const UNSET: i32 = -1;

/// A date split into the parts a date widget edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateObject {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    #[serde(default)]
    pub hour: i32,
    #[serde(default)]
    pub minute: i32,
    #[serde(default)]
    pub second: i32,
}

impl DateObject {
    /// Every part unset; time parts are `0` when time is not edited
    pub fn unset(include_time: bool) -> Self {
        let time = if include_time { UNSET } else { 0 };
        Self {
            year: UNSET,
            month: UNSET,
            day: UNSET,
            hour: time,
            minute: time,
            second: time,
        }
    }

    /// Returns whether every part has been set
    pub fn is_complete(&self) -> bool {
        [self.year, self.month, self.day, self.hour, self.minute, self.second]
            .iter()
            .all(|part| *part != UNSET)
    }
}

fn parse_utc(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Splits a date or date-time string into its parts.
///
/// An empty string gives unset parts. Strings without an offset are read
/// as UTC.
pub fn parse_date_string(text: &str, include_time: bool) -> UtilResult<DateObject> {
    if text.is_empty() {
        return Ok(DateObject::unset(include_time));
    }
    let utc = parse_utc(text).ok_or_else(|| UtilError::UnparsableDate(text.to_string()))?;
    let time = |part: u32| if include_time { part as i32 } else { 0 };
    Ok(DateObject {
        year: utc.year(),
        month: utc.month() as i32,
        day: utc.day() as i32,
        hour: time(utc.hour()),
        minute: time(utc.minute()),
        second: time(utc.second()),
    })
}

/// Joins date parts into `2016-04-05T14:01:30.000Z`, or `2016-04-05`
/// without time.
pub fn to_date_string(date: &DateObject, include_time: bool) -> UtilResult<String> {
    let invalid = || UtilError::InvalidDate(format!("{:?}", date));
    let part = |value: i32| u32::try_from(value).map_err(|_| invalid());

    let day = NaiveDate::from_ymd_opt(date.year, part(date.month)?, part(date.day)?).ok_or_else(invalid)?;
    if !include_time {
        return Ok(day.format("%Y-%m-%d").to_string());
    }
    let naive = day
        .and_hms_opt(part(date.hour)?, part(date.minute)?, part(date.second)?)
        .ok_or_else(invalid)?;
    Ok(Utc
        .from_utc_datetime(&naive)
        .to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Left-pads a number with zeros to `size` characters
pub fn pad(number: i64, size: usize) -> String {
    let digits = number.to_string();
    format!("{}{}", "0".repeat(size.saturating_sub(digits.len())), digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_time() {
        let parts = parse_date_string("2016-04-05T14:01:30.182Z", true).unwrap();
        assert_eq!(
            parts,
            DateObject {
                year: 2016,
                month: 4,
                day: 5,
                hour: 14,
                minute: 1,
                second: 30
            }
        );
    }

    #[test]
    fn test_parse_date_only() {
        let parts = parse_date_string("2016-04-05", false).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (2016, 4, 5));
        assert_eq!((parts.hour, parts.minute, parts.second), (0, 0, 0));
    }

    #[test]
    fn test_parse_offset_is_converted_to_utc() {
        let parts = parse_date_string("2016-04-05T23:30:00-02:00", true).unwrap();
        assert_eq!((parts.day, parts.hour), (6, 1));
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert_eq!(parse_date_string("", true).unwrap(), DateObject::unset(true));
        assert_eq!(parse_date_string("", false).unwrap().hour, 0);
        assert!(!DateObject::unset(true).is_complete());
        assert!(matches!(
            parse_date_string("yesterday", true),
            Err(UtilError::UnparsableDate(_))
        ));
    }

    #[test]
    fn test_to_date_string() {
        let date = DateObject {
            year: 2016,
            month: 4,
            day: 5,
            hour: 14,
            minute: 1,
            second: 30,
        };
        assert_eq!(to_date_string(&date, true).unwrap(), "2016-04-05T14:01:30.000Z");
        assert_eq!(to_date_string(&date, false).unwrap(), "2016-04-05");
        assert!(to_date_string(&DateObject::unset(true), true).is_err());
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad(4, 2), "04");
        assert_eq!(pad(2016, 2), "2016");
        assert_eq!(pad(7, 0), "7");
    }
}
