use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use signbook::config::AppConfig;
use signbook::db;
use signbook::handlers;
use signbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::catalog::list_services))
        .route(
            "/api/availability/dates",
            get(handlers::availability::get_dates),
        )
        .route(
            "/api/availability/slots",
            get(handlers::availability::get_slots),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/confirm",
            post(handlers::admin::confirm_booking),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route(
            "/api/admin/bookings/:id/reschedule",
            post(handlers::admin::reschedule_booking),
        )
        .route(
            "/api/admin/hours",
            get(handlers::admin::get_hours).put(handlers::admin::update_hours),
        )
        .route(
            "/api/admin/blocked",
            get(handlers::admin::get_blocked).post(handlers::admin::block_date),
        )
        .route("/api/admin/unblock", post(handlers::admin::unblock_date))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
