use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tower::ServiceExt;

use signbook::config::AppConfig;
use signbook::db;
use signbook::db::queries;
use signbook::handlers;
use signbook::models::BusinessHours;
use signbook::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    // Open every day so tests don't depend on which weekday they run
    let hours: Vec<BusinessHours> = (0..7)
        .map(|day| BusinessHours::new(day, "09:00", "17:00", true).unwrap())
        .collect();
    queries::replace_business_hours(&conn, &hours).unwrap();

    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
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
        .with_state(state)
}

/// A Wednesday at least a week out, so the date is always bookable relative
/// to the real clock the handlers consult.
fn future_wednesday() -> NaiveDate {
    let mut date = chrono::Local::now().date_naive() + Duration::days(7);
    while date.weekday() != Weekday::Wed {
        date += Duration::days(1);
    }
    date
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_payload(date: &NaiveDate, start_time: &str) -> String {
    serde_json::json!({
        "service_id": "general-notary",
        "date": date.format("%Y-%m-%d").to_string(),
        "start_time": start_time,
        "customer_name": "Alice Example",
        "customer_email": "alice@example.com",
    })
    .to_string()
}

fn post_booking(date: &NaiveDate, start_time: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("Content-Type", "application/json")
        .body(Body::from(booking_payload(date, start_time)))
        .unwrap()
}

// ── Health & catalog ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state());
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_services_returns_seeded_catalog() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/services")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    let services = json.as_array().unwrap();
    assert!(services.iter().any(|s| s["id"] == "general-notary"));
    assert!(services.iter().any(|s| s["id"] == "loan-signing"));
}

// ── Availability ──

#[tokio::test]
async fn test_slots_for_open_date() {
    let state = test_state();
    let app = test_app(Arc::clone(&state));
    let date = future_wednesday();

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/availability/slots?date={}&service_id=general-notary",
                    date.format("%Y-%m-%d")
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    assert_eq!(json["offerable"], true);
    // 09:00-17:00 window, 30-minute service: floor((480 - 30) / 30) + 1 = 16
    let slots = json["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 16);
    assert_eq!(slots[0]["start"], "09:00");
    assert_eq!(slots[0]["label"], "9:00 AM");
}

#[tokio::test]
async fn test_slots_unknown_service_is_404() {
    let app = test_app(test_state());
    let date = future_wednesday();

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/availability/slots?date={}&service_id=nope",
                    date.format("%Y-%m-%d")
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slots_malformed_date_is_400() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/availability/slots?date=tomorrow&service_id=general-notary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_past_date_not_offerable() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/availability/slots?date=2020-06-17&service_id=general-notary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    assert_eq!(json["offerable"], false);
    assert!(json["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blocked_date_drops_out_of_range() {
    let state = test_state();
    let date = future_wednesday();
    let date_str = date.format("%Y-%m-%d").to_string();

    let res = test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/blocked")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "date": date_str.as_str(), "reason": "court holiday" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let from = date - Duration::days(1);
    let to = date + Duration::days(1);
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/availability/dates?from={}&to={}",
                    from.format("%Y-%m-%d"),
                    to.format("%Y-%m-%d")
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    let dates: Vec<&str> = json["dates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert!(!dates.contains(&date_str.as_str()));
}

// ── Booking flow ──

#[tokio::test]
async fn test_create_booking_then_double_book_conflicts() {
    let state = test_state();
    let date = future_wednesday();

    let res = test_app(Arc::clone(&state))
        .oneshot(post_booking(&date, "10:00"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let json = json_body(res).await;
    assert_eq!(json["status"], "pending");
    assert_eq!(json["start_time"], "10:00");
    assert_eq!(json["end_time"], "10:30");

    // Same slot again: rejected at commit time
    let res = test_app(Arc::clone(&state))
        .oneshot(post_booking(&date, "10:00"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Within the 30-minute buffer: also rejected
    let res = test_app(Arc::clone(&state))
        .oneshot(post_booking(&date, "10:30"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Past the buffer: fine
    let res = test_app(state)
        .oneshot(post_booking(&date, "11:30"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_outside_hours_rejected() {
    let app = test_app(test_state());
    let date = future_wednesday();

    let res = app.oneshot(post_booking(&date, "18:00")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_frees_the_slot() {
    let state = test_state();
    let date = future_wednesday();

    let res = test_app(Arc::clone(&state))
        .oneshot(post_booking(&date, "10:00"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/bookings/{id}/cancel"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(post_booking(&date, "10:00"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

// ── Admin API ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_confirm_booking() {
    let state = test_state();
    let date = future_wednesday();

    let res = test_app(Arc::clone(&state))
        .oneshot(post_booking(&date, "14:00"))
        .await
        .unwrap();
    let id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/bookings/{id}/confirm"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings?status=confirmed")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(res).await;
    let bookings = json.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["id"], id.as_str());
}

#[tokio::test]
async fn test_reschedule_booking() {
    let state = test_state();
    let date = future_wednesday();
    let date_str = date.format("%Y-%m-%d").to_string();

    let res = test_app(Arc::clone(&state))
        .oneshot(post_booking(&date, "10:00"))
        .await
        .unwrap();
    let id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/bookings/{id}/reschedule"))
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "date": date_str.as_str(), "start_time": "13:00" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    assert_eq!(json["start_time"], "13:00");
    assert_eq!(json["end_time"], "13:30");

    // The vacated slot is bookable again
    let res = test_app(state)
        .oneshot(post_booking(&date, "10:00"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_confirm_unknown_booking_is_404() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/bookings/no-such-id/confirm")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_hours_roundtrip() {
    let state = test_state();

    let res = test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/admin/hours")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "hours": [
                            { "day_of_week": 3, "start_time": "09:00", "end_time": "12:00", "is_available": true }
                        ]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/hours")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(res).await;
    let hours = json["hours"].as_array().unwrap();
    assert_eq!(hours.len(), 1);
    assert_eq!(hours[0]["day_of_week"], 3);
    assert_eq!(hours[0]["end_time"], "12:00");
}

#[tokio::test]
async fn test_update_hours_rejects_inverted_window() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/admin/hours")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "hours": [
                            { "day_of_week": 3, "start_time": "15:00", "end_time": "09:00", "is_available": true }
                        ]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unblock_reports_removal() {
    let state = test_state();
    let date = future_wednesday();
    let date_str = date.format("%Y-%m-%d").to_string();

    test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/blocked")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::json!({ "date": date_str.as_str() }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let res = test_app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/unblock")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::json!({ "date": date_str.as_str() }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["removed"], true);

    // Second removal finds nothing
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/unblock")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::json!({ "date": date_str.as_str() }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await["removed"], false);
}
