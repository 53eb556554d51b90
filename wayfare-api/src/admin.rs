use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use wayfare_booking::{BookingStore, CancelOutcome, CatalogStore};
use wayfare_catalog::{Flight, Hotel, PackageDealBuilder, TravelService};

use crate::bookings::BookingResponse;
use crate::error::ApiError;
use crate::search::{FlightResult, HotelResult, PackageResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct FlightUpsert {
    airline: String,
    departure_city: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    flight_number: String,
    availability: i32,
    price: f64,
}

#[derive(Debug, Deserialize)]
struct HotelUpsert {
    name: String,
    location: String,
    rating: i32,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    availability: i32,
    price: f64,
}

#[derive(Debug, Deserialize)]
struct PackageCreate {
    flight_id: Uuid,
    hotel_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/flights", post(create_flight).get(list_flights))
        .route(
            "/v1/admin/flights/{id}",
            get(get_flight).put(update_flight).delete(delete_flight),
        )
        .route("/v1/admin/hotels", post(create_hotel).get(list_hotels))
        .route(
            "/v1/admin/hotels/{id}",
            get(get_hotel).put(update_hotel).delete(delete_hotel),
        )
        .route(
            "/v1/admin/package-deals",
            post(create_package_deal).get(list_package_deals),
        )
        .route("/v1/admin/package-deals/{id}", axum::routing::delete(delete_package_deal))
        .route("/v1/admin/bookings", get(list_bookings))
        .route("/v1/admin/bookings/{id}/cancel", post(cancel_booking))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<FlightUpsert>,
) -> Result<(StatusCode, Json<FlightResult>), ApiError> {
    let flight = Flight::new(
        req.airline,
        req.departure_city,
        req.destination,
        req.departure_time,
        req.arrival_time,
        req.flight_number,
        req.availability,
        req.price,
    )?;
    state.store.insert_flight(&flight).await?;
    Ok((StatusCode::CREATED, Json(FlightResult::from_domain(&flight))))
}

async fn list_flights(
    State(state): State<AppState>,
) -> Result<Json<Vec<FlightResult>>, ApiError> {
    let flights = state.store.list_flights().await?;
    Ok(Json(flights.iter().map(FlightResult::from_domain).collect()))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightResult>, ApiError> {
    let flight = state
        .store
        .flight(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("flight {id} not found")))?;
    Ok(Json(FlightResult::from_domain(&flight)))
}

async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FlightUpsert>,
) -> Result<Json<FlightResult>, ApiError> {
    let flight = Flight::restore(
        id,
        req.airline,
        req.departure_city,
        req.destination,
        req.departure_time,
        req.arrival_time,
        req.flight_number,
        req.availability,
        req.price,
    )?;
    state.store.update_flight(&flight).await?;
    Ok(Json(FlightResult::from_domain(&flight)))
}

async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_flight(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_hotel(
    State(state): State<AppState>,
    Json(req): Json<HotelUpsert>,
) -> Result<(StatusCode, Json<HotelResult>), ApiError> {
    let hotel = Hotel::new(
        req.name,
        req.location,
        req.rating,
        req.check_in_date,
        req.check_out_date,
        req.availability,
        req.price,
    )?;
    state.store.insert_hotel(&hotel).await?;
    Ok((StatusCode::CREATED, Json(HotelResult::from_domain(&hotel))))
}

async fn list_hotels(State(state): State<AppState>) -> Result<Json<Vec<HotelResult>>, ApiError> {
    let hotels = state.store.list_hotels().await?;
    Ok(Json(hotels.iter().map(HotelResult::from_domain).collect()))
}

async fn get_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HotelResult>, ApiError> {
    let hotel = state
        .store
        .hotel(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("hotel {id} not found")))?;
    Ok(Json(HotelResult::from_domain(&hotel)))
}

async fn update_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<HotelUpsert>,
) -> Result<Json<HotelResult>, ApiError> {
    let hotel = Hotel::restore(
        id,
        req.name,
        req.location,
        req.rating,
        req.check_in_date,
        req.check_out_date,
        req.availability,
        req.price,
    )?;
    state.store.update_hotel(&hotel).await?;
    Ok(Json(HotelResult::from_domain(&hotel)))
}

async fn delete_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_hotel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_package_deal(
    State(state): State<AppState>,
    Json(req): Json<PackageCreate>,
) -> Result<(StatusCode, Json<PackageResult>), ApiError> {
    let flight = state
        .store
        .flight(req.flight_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("flight {} not found", req.flight_id)))?;
    let hotel = state
        .store
        .hotel(req.hotel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("hotel {} not found", req.hotel_id)))?;

    let deal = PackageDealBuilder::new()
        .set_flight(&TravelService::Flight(flight))?
        .set_hotel(&TravelService::Hotel(hotel))?
        .set_dates(req.start_date, req.end_date)?
        .calculate_price()?
        .build()?;
    state.store.insert_package_deal(&deal).await?;

    let listing = state
        .store
        .package_listing(deal.id)
        .await?
        .ok_or_else(|| ApiError::Internal("freshly created deal vanished".to_string()))?;
    Ok((StatusCode::CREATED, Json(PackageResult::from_domain(&listing))))
}

async fn list_package_deals(
    State(state): State<AppState>,
) -> Result<Json<Vec<PackageResult>>, ApiError> {
    let listings = state.store.list_package_deals().await?;
    Ok(Json(
        listings.iter().map(PackageResult::from_domain).collect(),
    ))
}

async fn delete_package_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_package_deal(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_bookings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.store.list_bookings().await?;
    Ok(Json(
        bookings.iter().map(BookingResponse::from_domain).collect(),
    ))
}

/// Back-office cancellation, no ownership restriction.
async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.manager.cancel(id).await?;
    Ok(Json(serde_json::json!({
        "booking_id": id,
        "outcome": match outcome {
            CancelOutcome::Cancelled => "CANCELLED",
            CancelOutcome::AlreadyCancelled => "ALREADY_CANCELLED",
        },
    })))
}
