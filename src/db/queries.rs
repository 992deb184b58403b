use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    parse_calendar_date, parse_time_of_day, BlockedDate, Booking, BookingStatus, BusinessHours,
    Service,
};

// ── Business hours ──

pub fn get_business_hours(conn: &Connection) -> anyhow::Result<Vec<BusinessHours>> {
    let mut stmt = conn.prepare(
        "SELECT day_of_week, start_time, end_time, is_available
         FROM business_hours ORDER BY day_of_week ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let day_of_week: i64 = row.get(0)?;
        let start_time: String = row.get(1)?;
        let end_time: String = row.get(2)?;
        let is_available: bool = row.get::<_, i64>(3)? != 0;
        Ok((day_of_week, start_time, end_time, is_available))
    })?;

    let mut hours = vec![];
    for row in rows {
        let (day_of_week, start_time, end_time, is_available) = row?;
        hours.push(BusinessHours {
            day_of_week: day_of_week as u8,
            start_time: parse_time_of_day(&start_time)?,
            end_time: parse_time_of_day(&end_time)?,
            is_available,
        });
    }
    Ok(hours)
}

/// Replace the whole weekly schedule in one shot. Callers hand in at most one
/// row per weekday; days without a row are closed.
pub fn replace_business_hours(conn: &Connection, hours: &[BusinessHours]) -> anyhow::Result<()> {
    conn.execute("DELETE FROM business_hours", [])?;
    for h in hours {
        conn.execute(
            "INSERT INTO business_hours (day_of_week, start_time, end_time, is_available)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                h.day_of_week as i64,
                h.start_time.format("%H:%M").to_string(),
                h.end_time.format("%H:%M").to_string(),
                h.is_available as i64,
            ],
        )?;
    }
    Ok(())
}

// ── Blocked dates ──

pub fn list_blocked_dates(conn: &Connection) -> anyhow::Result<Vec<BlockedDate>> {
    let mut stmt =
        conn.prepare("SELECT date, reason FROM blocked_dates ORDER BY date ASC")?;
    let rows = stmt.query_map([], |row| {
        let date: String = row.get(0)?;
        let reason: Option<String> = row.get(1)?;
        Ok((date, reason))
    })?;

    let mut blocked = vec![];
    for row in rows {
        let (date, reason) = row?;
        blocked.push(BlockedDate {
            date: parse_calendar_date(&date)?,
            reason,
        });
    }
    Ok(blocked)
}

pub fn add_blocked_date(conn: &Connection, blocked: &BlockedDate) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO blocked_dates (date, reason) VALUES (?1, ?2)
         ON CONFLICT(date) DO UPDATE SET reason = excluded.reason",
        params![blocked.date.format("%Y-%m-%d").to_string(), blocked.reason],
    )?;
    Ok(())
}

pub fn remove_blocked_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM blocked_dates WHERE date = ?1",
        params![date.format("%Y-%m-%d").to_string()],
    )?;
    Ok(count > 0)
}

// ── Services ──

pub fn list_active_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_minutes, price_cents, active
         FROM services WHERE active = 1 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name, duration_minutes, price_cents, active FROM services WHERE id = ?1",
        params![id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        duration_minutes: row.get(2)?,
        price_cents: row.get(3)?,
        active: row.get::<_, i64>(4)? != 0,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, service_id, customer_name, customer_email, customer_phone,
                               date, start_time, end_time, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            booking.id,
            booking.service_id,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.date.format("%Y-%m-%d").to_string(),
            booking.start_time.format("%H:%M").to_string(),
            booking.end_time.format("%H:%M").to_string(),
            booking.status.as_str(),
            booking.notes,
            booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            booking.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

/// All bookings on a date, every status included. Status filtering belongs to
/// the availability calculator, which applies different rules on the display
/// and write paths.
pub fn get_bookings_on_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, service_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, status, notes, created_at, updated_at
         FROM bookings WHERE date = ?1 ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, service_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, status, notes, created_at, updated_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn update_booking_times(
    conn: &Connection,
    id: &str,
    date: NaiveDate,
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
) -> anyhow::Result<bool> {
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE bookings SET date = ?1, start_time = ?2, end_time = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            date.format("%Y-%m-%d").to_string(),
            start_time.format("%H:%M").to_string(),
            end_time.format("%H:%M").to_string(),
            now,
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, service_id, customer_name, customer_email, customer_phone,
                    date, start_time, end_time, status, notes, created_at, updated_at
             FROM bookings WHERE status = ?1 ORDER BY date DESC, start_time DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, service_id, customer_name, customer_email, customer_phone,
                    date, start_time, end_time, status, notes, created_at, updated_at
             FROM bookings ORDER BY date DESC, start_time DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let service_id: String = row.get(1)?;
    let customer_name: String = row.get(2)?;
    let customer_email: Option<String> = row.get(3)?;
    let customer_phone: Option<String> = row.get(4)?;
    let date_str: String = row.get(5)?;
    let start_str: String = row.get(6)?;
    let end_str: String = row.get(7)?;
    let status_str: String = row.get(8)?;
    let notes: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    // A row that no longer parses would silently corrupt conflict checks, so
    // surface it instead of substituting a default.
    let date = parse_calendar_date(&date_str)?;
    let start_time = parse_time_of_day(&start_str)?;
    let end_time = parse_time_of_day(&end_str)?;
    let created_at =
        chrono::NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")?;
    let updated_at =
        chrono::NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")?;

    Ok(Booking {
        id,
        service_id,
        customer_name,
        customer_email,
        customer_phone,
        date,
        start_time,
        end_time,
        status: BookingStatus::parse(&status_str),
        notes,
        created_at,
        updated_at,
    })
}
