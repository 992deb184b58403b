use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Weekly opening window for one day of week (0 = Sunday .. 6 = Saturday).
/// A weekday with no row is closed; `is_available = false` keeps the row
/// around but closes the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl BusinessHours {
    pub fn new(
        day_of_week: u8,
        start: &str,
        end: &str,
        is_available: bool,
    ) -> Result<Self, AppError> {
        if day_of_week > 6 {
            return Err(AppError::Validation(format!(
                "day of week out of range: {day_of_week}"
            )));
        }
        let start_time = super::parse_time_of_day(start)?;
        let end_time = super::parse_time_of_day(end)?;
        if is_available && start_time >= end_time {
            return Err(AppError::Validation(format!(
                "start time {start} must be before end time {end}"
            )));
        }
        Ok(Self {
            day_of_week,
            start_time,
            end_time,
            is_available,
        })
    }
}
