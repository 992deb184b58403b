use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{parse_calendar_date, parse_time_of_day, Booking};
use crate::services::booking::{self, BookingRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub date: String,
    pub start_time: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            service_id: b.service_id,
            customer_name: b.customer_name,
            customer_email: b.customer_email,
            customer_phone: b.customer_phone,
            date: b.date.format("%Y-%m-%d").to_string(),
            start_time: b.start_time.format("%H:%M").to_string(),
            end_time: b.end_time.format("%H:%M").to_string(),
            status: b.status.as_str().to_string(),
            notes: b.notes,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let date = parse_calendar_date(&payload.date)?;
    let start_time = parse_time_of_day(&payload.start_time)?;

    let mut db = state.db.lock().unwrap();

    let service = queries::get_service(&db, &payload.service_id)?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::NotFound(format!("service {}", payload.service_id)))?;

    let booking = booking::create_booking(
        &mut db,
        Local::now().date_naive(),
        BookingRequest {
            service,
            date,
            start_time,
            customer_name: payload.customer_name,
            customer_email: payload.customer_email,
            customer_phone: payload.customer_phone,
            notes: payload.notes,
        },
    )?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}
