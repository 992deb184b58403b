pub mod blocked_date;
pub mod booking;
pub mod business_hours;
pub mod service;

pub use blocked_date::BlockedDate;
pub use booking::{Booking, BookingStatus};
pub use business_hours::BusinessHours;
pub use service::Service;

use chrono::{NaiveDate, NaiveTime};

use crate::errors::AppError;

/// Parse a wall-clock time in the wire formats used by persisted rows
/// ("HH:MM" or "HH:MM:SS"). Malformed input is rejected, never coerced.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("invalid time of day: {s}")))
}

/// Parse a calendar date in "YYYY-MM-DD" form.
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_hhmm() {
        let t = parse_time_of_day("09:30").unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn test_parse_time_hhmmss() {
        let t = parse_time_of_day("14:00:00").unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "14:00");
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("9am").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_calendar_date("2025-06-18").is_ok());
        assert!(parse_calendar_date("06/18/2025").is_err());
        assert!(parse_calendar_date("2025-13-01").is_err());
    }
}
