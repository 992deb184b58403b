use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::models::{BlockedDate, Booking, BookingStatus, BusinessHours};

/// Candidate start times advance on a fixed half-hour grid.
pub const SLOT_INCREMENT_MINUTES: i64 = 30;

/// Padding applied around existing bookings so appointments are never
/// scheduled back-to-back. Fixed, not per service.
pub const BUFFER_MINUTES: i64 = 30;

/// A bookable start time for one date, paired with its display label
/// ("2:30 PM"). Derived on every call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveTime,
    pub label: String,
}

/// Whether a date can be offered for booking at all: not in the past, not
/// blocked, and falling on a weekday with an open business-hours row.
pub fn is_date_offerable(
    date: NaiveDate,
    today: NaiveDate,
    blocked_dates: &[BlockedDate],
    business_hours: &[BusinessHours],
) -> bool {
    if date < today {
        return false;
    }
    if blocked_dates.iter().any(|b| b.date == date) {
        return false;
    }
    let day = weekday_index(date);
    business_hours
        .iter()
        .any(|h| h.day_of_week == day && h.is_available)
}

/// Generate offerable start times for `date`, walking the open window in
/// half-hour steps and dropping candidates whose buffered interval overlaps a
/// confirmed booking on that date. Pending bookings do not hide slots here;
/// the write-time guard in `has_conflict` still counts them.
pub fn generate_slots(
    date: NaiveDate,
    duration_minutes: i64,
    business_hours: &[BusinessHours],
    bookings: &[Booking],
) -> Vec<Slot> {
    if duration_minutes <= 0 {
        return vec![];
    }

    let day = weekday_index(date);
    let Some(window) = business_hours
        .iter()
        .find(|h| h.day_of_week == day && h.is_available)
    else {
        return vec![];
    };

    let open = minutes_since_midnight(window.start_time);
    let close = minutes_since_midnight(window.end_time);

    let booked: Vec<(i64, i64)> = bookings
        .iter()
        .filter(|b| b.date == date && b.status == BookingStatus::Confirmed)
        .map(|b| {
            (
                minutes_since_midnight(b.start_time),
                minutes_since_midnight(b.end_time),
            )
        })
        .collect();

    let mut slots = vec![];
    let mut start = open;
    while start + duration_minutes <= close {
        let end = start + duration_minutes;
        if !booked
            .iter()
            .any(|&(b_start, b_end)| overlaps_buffered(start, end, b_start, b_end))
        {
            let time = time_from_minutes(start);
            slots.push(Slot {
                start: time,
                label: format_label(time),
            });
        }
        start += SLOT_INCREMENT_MINUTES;
    }
    slots
}

/// Write-time guard: would a booking of `duration_minutes` starting at
/// `start_time` on `date` overlap any existing non-cancelled booking, buffer
/// included? Run this against a fresh read inside the same transaction as the
/// insert; a snapshot that went stale between display and commit is exactly
/// the race this re-check closes.
pub fn has_conflict(
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i64,
    bookings: &[Booking],
    exclude_id: Option<&str>,
) -> bool {
    let start = minutes_since_midnight(start_time);
    let end = start + duration_minutes;

    bookings
        .iter()
        .filter(|b| b.date == date && b.status != BookingStatus::Cancelled)
        .filter(|b| exclude_id != Some(b.id.as_str()))
        .any(|b| {
            overlaps_buffered(
                start,
                end,
                minutes_since_midnight(b.start_time),
                minutes_since_midnight(b.end_time),
            )
        })
}

/// Symmetric overlap test on buffered intervals, in minutes since midnight.
/// Back-to-back appointments closer than the buffer count as conflicting;
/// touching the buffered boundary exactly does not.
fn overlaps_buffered(cand_start: i64, cand_end: i64, booking_start: i64, booking_end: i64) -> bool {
    cand_start < booking_end + BUFFER_MINUTES && cand_end > booking_start - BUFFER_MINUTES
}

pub fn format_label(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

fn minutes_since_midnight(time: NaiveTime) -> i64 {
    (time.num_seconds_from_midnight() / 60) as i64
}

fn time_from_minutes(minutes: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
        .unwrap_or(NaiveTime::MIN)
}
