use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Service};
use crate::services::availability;

pub struct BookingRequest {
    pub service: Service,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Commit a booking. The conflict check runs against a fresh read of the
/// date's bookings inside the same transaction as the insert, so two callers
/// racing for one slot are serialized by SQLite; the slot list shown to the
/// client earlier is only advisory. A lost race surfaces as `SlotUnavailable`
/// and the caller picks a different slot, no automatic retry.
pub fn create_booking(
    conn: &mut Connection,
    today: NaiveDate,
    req: BookingRequest,
) -> Result<Booking, AppError> {
    let customer_name = req.customer_name.trim().to_string();
    if customer_name.is_empty() {
        return Err(AppError::Validation("customer name is required".to_string()));
    }
    if req.service.duration_minutes <= 0 {
        return Err(AppError::Validation(format!(
            "service {} has no usable duration",
            req.service.id
        )));
    }

    let tx = conn.transaction()?;

    check_date_and_window(&tx, today, req.date, req.start_time, req.service.duration_minutes)?;

    let existing = queries::get_bookings_on_date(&tx, req.date)?;
    if availability::has_conflict(
        req.date,
        req.start_time,
        req.service.duration_minutes,
        &existing,
        None,
    ) {
        return Err(AppError::SlotUnavailable);
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        service_id: req.service.id.clone(),
        customer_name,
        customer_email: req.customer_email,
        customer_phone: req.customer_phone,
        date: req.date,
        start_time: req.start_time,
        end_time: req.start_time + Duration::minutes(req.service.duration_minutes),
        status: BookingStatus::Pending,
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };

    queries::create_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        date = %booking.date,
        start = %booking.start_time.format("%H:%M"),
        "booking created"
    );

    Ok(booking)
}

/// Move an existing booking to a new slot, keeping its duration. The booking
/// being moved is excluded from the conflict scan so it can land on or next
/// to its own current interval.
pub fn reschedule_booking(
    conn: &mut Connection,
    today: NaiveDate,
    id: &str,
    date: NaiveDate,
    start_time: NaiveTime,
) -> Result<Booking, AppError> {
    let tx = conn.transaction()?;

    let mut booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Validation(
            "cannot reschedule a cancelled booking".to_string(),
        ));
    }

    let duration = (booking.end_time - booking.start_time).num_minutes();

    check_date_and_window(&tx, today, date, start_time, duration)?;

    let existing = queries::get_bookings_on_date(&tx, date)?;
    if availability::has_conflict(date, start_time, duration, &existing, Some(id)) {
        return Err(AppError::SlotUnavailable);
    }

    let end_time = start_time + Duration::minutes(duration);
    queries::update_booking_times(&tx, id, date, start_time, end_time)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %id,
        date = %date,
        start = %start_time.format("%H:%M"),
        "booking rescheduled"
    );

    booking.date = date;
    booking.start_time = start_time;
    booking.end_time = end_time;
    Ok(booking)
}

fn check_date_and_window(
    conn: &Connection,
    today: NaiveDate,
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i64,
) -> Result<(), AppError> {
    let hours = queries::get_business_hours(conn)?;
    let blocked = queries::list_blocked_dates(conn)?;
    if !availability::is_date_offerable(date, today, &blocked, &hours) {
        return Err(AppError::Validation(format!(
            "date {} is not open for booking",
            date.format("%Y-%m-%d")
        )));
    }

    let day = date.weekday().num_days_from_sunday() as u8;
    let window = hours
        .iter()
        .find(|h| h.day_of_week == day && h.is_available)
        .ok_or_else(|| AppError::Validation("no business hours for that day".to_string()))?;

    let start_min = (start_time.num_seconds_from_midnight() / 60) as i64;
    let open_min = (window.start_time.num_seconds_from_midnight() / 60) as i64;
    let close_min = (window.end_time.num_seconds_from_midnight() / 60) as i64;
    if start_min < open_min || start_min + duration_minutes > close_min {
        return Err(AppError::Validation(
            "requested time is outside business hours".to_string(),
        ));
    }

    Ok(())
}
