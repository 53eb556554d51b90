//! End-to-end tests over the full router with the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use wayfare_api::{app, state::AuthConfig, AppState};
use wayfare_store::{MemoryStore, PendingSearchStore};

const ADMIN_KEY: &str = "sesame";

fn test_app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(PendingSearchStore::new(Duration::from_secs(60))),
        AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
            admin_key: ADMIN_KEY.to_string(),
        },
    );
    app(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/auth/admin",
        None,
        Some(json!({ "key": ADMIN_KEY })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn customer_token(app: &Router, name: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn seed_flight(app: &Router, admin: &str, availability: i32, price: f64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/admin/flights",
        Some(admin),
        Some(json!({
            "airline": "Aurora Air",
            "departure_city": "Oslo",
            "destination": "Lisbon",
            "departure_time": "2026-09-01T08:00:00Z",
            "arrival_time": "2026-09-01T12:30:00Z",
            "flight_number": "AA204",
            "availability": availability,
            "price": price,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn seed_hotel(app: &Router, admin: &str, availability: i32, price: f64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/admin/hotels",
        Some(admin),
        Some(json!({
            "name": "Hotel Miradouro",
            "location": "Lisbon",
            "rating": 4,
            "check_in_date": "2026-09-01",
            "check_out_date": "2026-09-08",
            "availability": availability,
            "price": price,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn flight_availability(app: &Router, admin: &str, flight_id: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::GET,
        &format!("/v1/admin/flights/{flight_id}"),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["availability"].as_i64().unwrap()
}

async fn search_flights(app: &Router, guests: i32) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/search",
        None,
        Some(json!({
            "booking_type": "FLIGHT",
            "destination": "lisbon",
            "guests": guests,
            "departure_city": "Oslo",
            "departure_date": "2026-08-30",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_flight_booking_lifecycle_over_http() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let customer = customer_token(&app, "Mara Voss", "mara@example.com").await;
    let flight_id = seed_flight(&app, &admin, 5, 100.0).await;

    let search = search_flights(&app, 3).await;
    assert_eq!(search["flights"].as_array().unwrap().len(), 1);
    let token = search["search_token"].as_str().unwrap();

    let (status, booking) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&customer),
        Some(json!({ "search_token": token, "item_id": flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["num_people"], 3);
    assert!((booking["total_price"].as_f64().unwrap() - 360.0).abs() < 1e-9);
    assert_eq!(flight_availability(&app, &admin, &flight_id).await, 2);
    let booking_id = booking["booking_id"].as_str().unwrap().to_string();

    // Grow into the remaining seats.
    let (status, resized) = send(
        &app,
        Method::PATCH,
        &format!("/v1/bookings/{booking_id}"),
        Some(&customer),
        Some(json!({ "num_people": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!((resized["total_price"].as_f64().unwrap() - 600.0).abs() < 1e-9);
    assert_eq!(flight_availability(&app, &admin, &flight_id).await, 0);

    // One more head than the flight has.
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/bookings/{booking_id}"),
        Some(&customer),
        Some(json!({ "num_people": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cancelled) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{booking_id}/cancel"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["outcome"], "CANCELLED");
    assert_eq!(flight_availability(&app, &admin, &flight_id).await, 5);

    let (status, cancelled) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{booking_id}/cancel"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["outcome"], "ALREADY_CANCELLED");
    assert_eq!(flight_availability(&app, &admin, &flight_id).await, 5);
}

#[tokio::test]
async fn test_package_booking_over_http() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let customer = customer_token(&app, "Mara Voss", "mara@example.com").await;
    let flight_id = seed_flight(&app, &admin, 2, 100.0).await;
    let hotel_id = seed_hotel(&app, &admin, 2, 100.0).await;

    let (status, deal) = send(
        &app,
        Method::POST,
        "/v1/admin/package-deals",
        Some(&admin),
        Some(json!({
            "flight_id": flight_id,
            "hotel_id": hotel_id,
            "start_date": "2026-09-01",
            "end_date": "2026-09-08",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!((deal["price"].as_f64().unwrap() - 230.0).abs() < 1e-9);
    assert_eq!(deal["availability"], 2);
    let deal_id = deal["id"].as_str().unwrap().to_string();

    let (status, search) = send(
        &app,
        Method::POST,
        "/v1/search",
        None,
        Some(json!({
            "booking_type": "PACKAGE_DEAL",
            "destination": "Lisbon",
            "guests": 2,
            "check_in": "2026-09-02",
            "check_out": "2026-09-06",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(search["package_deals"].as_array().unwrap().len(), 1);
    let token = search["search_token"].as_str().unwrap();

    let (status, booking) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&customer),
        Some(json!({ "search_token": token, "item_id": deal_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Two travellers at 120 + 110 each.
    assert!((booking["total_price"].as_f64().unwrap() - 460.0).abs() < 1e-9);
    assert_eq!(flight_availability(&app, &admin, &flight_id).await, 0);

    let booking_id = booking["booking_id"].as_str().unwrap();
    let (status, cancelled) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{booking_id}/cancel"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["outcome"], "CANCELLED");
    assert_eq!(flight_availability(&app, &admin, &flight_id).await, 2);
}

#[tokio::test]
async fn test_booking_requires_customer_token() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let flight_id = seed_flight(&app, &admin, 5, 100.0).await;
    let search = search_flights(&app, 2).await;
    let token = search["search_token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        None,
        Some(json!({ "search_token": token, "item_id": flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An admin token is not a customer token.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&admin),
        Some(json!({ "search_token": token, "item_id": flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_reject_customer_tokens() {
    let app = test_app();
    let customer = customer_token(&app, "Mara Voss", "mara@example.com").await;

    let (status, _) = send(&app, Method::GET, "/v1/admin/bookings", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/v1/admin/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_validation_errors() {
    let app = test_app();

    // Reversed stay dates.
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/search",
        None,
        Some(json!({
            "booking_type": "HOTEL",
            "destination": "Lisbon",
            "guests": 2,
            "check_in": "2026-09-08",
            "check_out": "2026-09-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("before"));

    // Flight search without a departure city.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/search",
        None,
        Some(json!({
            "booking_type": "FLIGHT",
            "destination": "Lisbon",
            "guests": 2,
            "departure_date": "2026-08-30",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Zero travellers.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/search",
        None,
        Some(json!({
            "booking_type": "HOTEL",
            "destination": "Lisbon",
            "guests": 0,
            "check_in": "2026-09-01",
            "check_out": "2026-09-08",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_search_token_is_gone() {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(PendingSearchStore::new(Duration::ZERO)),
        AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
            admin_key: ADMIN_KEY.to_string(),
        },
    );
    let app = app(state);
    let admin = admin_token(&app).await;
    let customer = customer_token(&app, "Mara Voss", "mara@example.com").await;
    let flight_id = seed_flight(&app, &admin, 5, 100.0).await;

    let search = search_flights(&app, 2).await;
    let token = search["search_token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&customer),
        Some(json!({ "search_token": token, "item_id": flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_customers_cannot_touch_foreign_bookings() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let mara = customer_token(&app, "Mara Voss", "mara@example.com").await;
    let noor = customer_token(&app, "Noor Haddad", "noor@example.com").await;
    let flight_id = seed_flight(&app, &admin, 5, 100.0).await;

    let search = search_flights(&app, 2).await;
    let token = search["search_token"].as_str().unwrap();
    let (status, booking) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&mara),
        Some(json!({ "search_token": token, "item_id": flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{booking_id}/cancel"),
        Some(&noor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_rejects_taken_email() {
    let app = test_app();
    let _mara = customer_token(&app, "Mara Voss", "mara@example.com").await;
    let noor = customer_token(&app, "Noor Haddad", "noor@example.com").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/profile",
        Some(&noor),
        Some(json!({ "name": "Noor Haddad", "email": "mara@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, profile) = send(&app, Method::GET, "/v1/profile", Some(&noor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["email"], "noor@example.com");
}
