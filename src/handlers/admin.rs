use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::bookings::BookingResponse;
use crate::models::{
    parse_calendar_date, parse_time_of_day, BlockedDate, BookingStatus, BusinessHours,
};
use crate::services::booking;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, query.status.as_deref(), limit)?
    };

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// POST /api/admin/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    set_booking_status(&state, &headers, &id, BookingStatus::Confirmed)
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    set_booking_status(&state, &headers, &id, BookingStatus::Cancelled)
}

fn set_booking_status(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    status: BookingStatus,
) -> Result<Json<Value>, AppError> {
    check_auth(headers, &state.config.admin_token)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(&db, id, &status)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("booking {id}")));
    }

    tracing::info!(booking_id = %id, status = status.as_str(), "booking status updated");
    Ok(Json(json!({ "id": id, "status": status.as_str() })))
}

// POST /api/admin/bookings/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: String,
    pub start_time: String,
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = parse_calendar_date(&payload.date)?;
    let start_time = parse_time_of_day(&payload.start_time)?;

    let booking = {
        let mut db = state.db.lock().unwrap();
        booking::reschedule_booking(
            &mut db,
            chrono::Local::now().date_naive(),
            &id,
            date,
            start_time,
        )?
    };

    Ok(Json(booking.into()))
}

// GET /api/admin/hours, PUT /api/admin/hours
#[derive(Serialize, Deserialize)]
pub struct HoursRow {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

#[derive(Serialize, Deserialize)]
pub struct HoursPayload {
    pub hours: Vec<HoursRow>,
}

pub async fn get_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<HoursPayload>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let hours = {
        let db = state.db.lock().unwrap();
        queries::get_business_hours(&db)?
    };

    let rows = hours
        .into_iter()
        .map(|h| HoursRow {
            day_of_week: h.day_of_week,
            start_time: h.start_time.format("%H:%M").to_string(),
            end_time: h.end_time.format("%H:%M").to_string(),
            is_available: h.is_available,
        })
        .collect();

    Ok(Json(HoursPayload { hours: rows }))
}

pub async fn update_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<HoursPayload>,
) -> Result<Json<Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut parsed: Vec<BusinessHours> = Vec::with_capacity(payload.hours.len());
    for row in &payload.hours {
        if parsed.iter().any(|h| h.day_of_week == row.day_of_week) {
            return Err(AppError::Validation(format!(
                "duplicate row for day of week {}",
                row.day_of_week
            )));
        }
        parsed.push(BusinessHours::new(
            row.day_of_week,
            &row.start_time,
            &row.end_time,
            row.is_available,
        )?);
    }

    {
        let db = state.db.lock().unwrap();
        queries::replace_business_hours(&db, &parsed)?;
    }

    Ok(Json(json!({ "updated": parsed.len() })))
}

// GET /api/admin/blocked, POST /api/admin/blocked, POST /api/admin/unblock
#[derive(Serialize)]
pub struct BlockedDateResponse {
    date: String,
    reason: Option<String>,
}

pub async fn get_blocked(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BlockedDateResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let blocked = {
        let db = state.db.lock().unwrap();
        queries::list_blocked_dates(&db)?
    };

    Ok(Json(
        blocked
            .into_iter()
            .map(|b| BlockedDateResponse {
                date: b.date.format("%Y-%m-%d").to_string(),
                reason: b.reason,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct BlockDateRequest {
    pub date: String,
    pub reason: Option<String>,
}

pub async fn block_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<BlockDateRequest>,
) -> Result<Json<Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = parse_calendar_date(&payload.date)?;
    {
        let db = state.db.lock().unwrap();
        queries::add_blocked_date(
            &db,
            &BlockedDate {
                date,
                reason: payload.reason,
            },
        )?;
    }

    Ok(Json(json!({ "blocked": payload.date })))
}

#[derive(Deserialize)]
pub struct UnblockDateRequest {
    pub date: String,
}

pub async fn unblock_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<UnblockDateRequest>,
) -> Result<Json<Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = parse_calendar_date(&payload.date)?;
    let removed = {
        let db = state.db.lock().unwrap();
        queries::remove_blocked_date(&db, date)?
    };

    Ok(Json(json!({ "removed": removed })))
}
