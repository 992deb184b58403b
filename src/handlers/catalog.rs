use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ServiceResponse {
    id: String,
    name: String,
    duration_minutes: i64,
    price_cents: i64,
}

// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_active_services(&db)?
    };

    let response = services
        .into_iter()
        .map(|s| ServiceResponse {
            id: s.id,
            name: s.name,
            duration_minutes: s.duration_minutes,
            price_cents: s.price_cents,
        })
        .collect();

    Ok(Json(response))
}
