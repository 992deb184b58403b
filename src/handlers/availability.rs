use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::parse_calendar_date;
use crate::services::availability;
use crate::state::AppState;

const MAX_RANGE_DAYS: i64 = 92;

// GET /api/availability/dates
#[derive(Deserialize)]
pub struct DatesQuery {
    pub from: String,
    pub to: String,
}

#[derive(Serialize)]
pub struct DatesResponse {
    dates: Vec<String>,
}

pub async fn get_dates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DatesQuery>,
) -> Result<Json<DatesResponse>, AppError> {
    let from = parse_calendar_date(&query.from)?;
    let to = parse_calendar_date(&query.to)?;
    if to < from {
        return Err(AppError::Validation("'to' must not precede 'from'".to_string()));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "date range too large (max {MAX_RANGE_DAYS} days)"
        )));
    }

    let (hours, blocked) = {
        let db = state.db.lock().unwrap();
        (
            queries::get_business_hours(&db)?,
            queries::list_blocked_dates(&db)?,
        )
    };

    let today = Local::now().date_naive();
    let dates = from
        .iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| availability::is_date_offerable(*d, today, &blocked, &hours))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    Ok(Json(DatesResponse { dates }))
}

// GET /api/availability/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub service_id: String,
}

#[derive(Serialize)]
pub struct SlotResponse {
    start: String,
    label: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: String,
    offerable: bool,
    slots: Vec<SlotResponse>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let date = parse_calendar_date(&query.date)?;

    let db = state.db.lock().unwrap();

    let service = queries::get_service(&db, &query.service_id)?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::NotFound(format!("service {}", query.service_id)))?;

    let hours = queries::get_business_hours(&db)?;
    let blocked = queries::list_blocked_dates(&db)?;

    let today = Local::now().date_naive();
    if !availability::is_date_offerable(date, today, &blocked, &hours) {
        return Ok(Json(SlotsResponse {
            date: query.date,
            offerable: false,
            slots: vec![],
        }));
    }

    let bookings = queries::get_bookings_on_date(&db, date)?;
    let slots = availability::generate_slots(date, service.duration_minutes, &hours, &bookings)
        .into_iter()
        .map(|s| SlotResponse {
            start: s.start.format("%H:%M").to_string(),
            label: s.label,
        })
        .collect();

    Ok(Json(SlotsResponse {
        date: query.date,
        offerable: true,
        slots,
    }))
}
