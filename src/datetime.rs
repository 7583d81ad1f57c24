// Booking date/time utilities
// Bookings are stored by the API in UTC. The traveler picks a date and time in the
// activity's local zone, given here as a fixed UTC offset in minutes east of Greenwich.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Utc,
};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ValidationError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "utc_offset".to_string(),
            value: minutes.to_string(),
        })
}

// Wall-clock time at `offset` -> instant in UTC
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

// Instant in UTC -> wall-clock time at `offset`
pub fn utc_to_local(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    instant.with_timezone(&offset).naive_local()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: "date".to_string(),
            value: value.to_string(),
        }
    })
}

pub fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: "time".to_string(),
            value: value.to_string(),
        })
}

// Accepts RFC 3339 or a bare `YYYY-MM-DD HH:MM[:SS]`, the latter read as UTC
pub fn parse_booking_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "datetime".to_string(),
            value: value.to_string(),
        })
}

pub fn format_booking_datetime(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// Splits a stored UTC booking into the date and time strings shown in the editor
pub fn display_local(instant: DateTime<Utc>, offset: FixedOffset) -> (String, String) {
    let local = utc_to_local(instant, offset);
    (
        local.date().format(DATE_FORMAT).to_string(),
        local.time().format(TIME_FORMAT).to_string(),
    )
}

pub fn ensure_not_in_past(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date < today {
        return Err(ValidationError::DateInPast(date));
    }
    Ok(())
}

const MINUTES_PER_DAY: u64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DurationParts {
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
}

impl DurationParts {
    // Day counts beyond u32 saturate
    pub fn from_minutes(total: u64) -> Self {
        Self {
            days: u32::try_from(total / MINUTES_PER_DAY).unwrap_or(u32::MAX),
            hours: ((total / 60) % 24) as u32,
            minutes: (total % 60) as u32,
        }
    }

    // Saturates on oversized wire values
    pub fn total_minutes(&self) -> u64 {
        u64::from(self.days)
            .saturating_mul(MINUTES_PER_DAY)
            .saturating_add(u64::from(self.hours).saturating_mul(60))
            .saturating_add(u64::from(self.minutes))
    }

    // Normalised compact form, e.g. "1 day 2h 30m"
    pub fn display(&self) -> String {
        let normalised = Self::from_minutes(self.total_minutes());
        let mut parts = Vec::new();
        match normalised.days {
            0 => {}
            1 => parts.push("1 day".to_string()),
            d => parts.push(format!("{d} days")),
        }
        if normalised.hours > 0 {
            parts.push(format!("{}h", normalised.hours));
        }
        if normalised.minutes > 0 {
            parts.push(format!("{}m", normalised.minutes));
        }

        if parts.is_empty() {
            "0m".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_local_to_utc_and_back() {
        let dubai = offset_from_minutes(240).unwrap();
        let utc = local_to_utc(date(2025, 6, 10), time(9, 30), dubai);
        assert_eq!(format_booking_datetime(utc), "2025-06-10T05:30:00Z");

        let local = utc_to_local(utc, dubai);
        assert_eq!(local, date(2025, 6, 10).and_time(time(9, 30)));
    }

    #[test]
    fn test_local_to_utc_crosses_midnight() {
        let new_york = offset_from_minutes(-300).unwrap();
        let utc = local_to_utc(date(2025, 12, 31), time(21, 0), new_york);
        assert_eq!(format_booking_datetime(utc), "2026-01-01T02:00:00Z");

        let (d, t) = display_local(utc, new_york);
        assert_eq!(d, "2025-12-31");
        assert_eq!(t, "21:00");
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(offset_from_minutes(24 * 60).is_err());
        assert!(offset_from_minutes(-(14 * 60)).is_ok());
    }

    #[test]
    fn test_parse_booking_datetime() {
        let a = parse_booking_datetime("2025-06-10T10:00:00+02:00").unwrap();
        assert_eq!(format_booking_datetime(a), "2025-06-10T08:00:00Z");

        let b = parse_booking_datetime("2025-06-10 10:00").unwrap();
        assert_eq!(format_booking_datetime(b), "2025-06-10T10:00:00Z");

        assert!(parse_booking_datetime("10/06/2025").is_err());
    }

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(parse_date("2025-06-10").unwrap(), date(2025, 6, 10));
        assert!(parse_date("2025-13-10").is_err());
        assert_eq!(parse_time("07:45").unwrap(), time(7, 45));
        assert_eq!(parse_time("07:45:00").unwrap(), time(7, 45));
        assert!(parse_time("7pm").is_err());
    }

    #[test]
    fn test_ensure_not_in_past() {
        let today = date(2025, 6, 10);
        assert!(ensure_not_in_past(today, today).is_ok());
        assert!(ensure_not_in_past(date(2025, 6, 11), today).is_ok());
        assert_eq!(
            ensure_not_in_past(date(2025, 6, 9), today),
            Err(ValidationError::DateInPast(date(2025, 6, 9)))
        );
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(DurationParts::from_minutes(150).display(), "2h 30m");
        assert_eq!(DurationParts::from_minutes(45).display(), "45m");
        assert_eq!(DurationParts::from_minutes(24 * 60).display(), "1 day");

        let huge = DurationParts {
            days: u32::MAX,
            hours: u32::MAX,
            minutes: u32::MAX,
        };
        assert!(huge.total_minutes() > u64::from(u32::MAX));
        assert!(huge.display().ends_with("m"));
        assert_eq!(DurationParts::from_minutes(u64::MAX).days, u32::MAX);
        assert_eq!(
            DurationParts {
                days: 1,
                hours: 26,
                minutes: 0
            }
            .display(),
            "2 days 2h"
        );
        assert_eq!(DurationParts::default().display(), "0m");
    }
}
