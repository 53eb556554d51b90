use axum::{extract::State, routing::post, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfare_booking::{CatalogStore, PackageListing, PendingSearch};
use wayfare_catalog::{Flight, Hotel, ServiceCost, ServiceKind};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub booking_type: ServiceKind,
    pub destination: String,
    pub guests: i32,
    pub departure_city: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_token: Uuid,
    pub flights: Vec<FlightResult>,
    pub hotels: Vec<HotelResult>,
    pub package_deals: Vec<PackageResult>,
}

#[derive(Debug, Serialize)]
pub struct FlightResult {
    pub id: Uuid,
    pub airline: String,
    pub departure_city: String,
    pub destination: String,
    pub departure_time: chrono::DateTime<chrono::Utc>,
    pub arrival_time: chrono::DateTime<chrono::Utc>,
    pub flight_number: String,
    pub availability: i32,
    pub unit_cost: f64,
}

impl FlightResult {
    pub fn from_domain(flight: &Flight) -> Self {
        Self {
            id: flight.id,
            airline: flight.airline.clone(),
            departure_city: flight.departure_city.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            flight_number: flight.flight_number.clone(),
            availability: flight.availability(),
            unit_cost: flight.unit_cost(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HotelResult {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub rating: i32,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub availability: i32,
    pub unit_cost: f64,
}

impl HotelResult {
    pub fn from_domain(hotel: &Hotel) -> Self {
        Self {
            id: hotel.id,
            name: hotel.name.clone(),
            location: hotel.location.clone(),
            rating: hotel.rating,
            check_in_date: hotel.check_in_date,
            check_out_date: hotel.check_out_date,
            availability: hotel.availability(),
            unit_cost: hotel.unit_cost(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PackageResult {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub availability: i32,
    pub unit_cost: f64,
    pub flight: FlightResult,
    pub hotel: HotelResult,
}

impl PackageResult {
    pub fn from_domain(listing: &PackageListing) -> Self {
        Self {
            id: listing.deal.id,
            start_date: listing.deal.start_date,
            end_date: listing.deal.end_date,
            price: listing.deal.price(),
            availability: listing.availability(),
            unit_cost: listing.unit_cost(),
            flight: FlightResult::from_domain(&listing.flight),
            hotel: HotelResult::from_domain(&listing.hotel),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/search", post(search))
}

async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let pending = pending_search(req)?;

    let mut response = SearchResponse {
        search_token: Uuid::nil(),
        flights: Vec::new(),
        hotels: Vec::new(),
        package_deals: Vec::new(),
    };

    match pending.kind {
        ServiceKind::Flight => {
            let flights = state.store.search_flights(&pending.flight_query()).await?;
            response.flights = flights.iter().map(FlightResult::from_domain).collect();
        }
        ServiceKind::Hotel => {
            let hotels = state.store.search_hotels(&pending.hotel_query()).await?;
            response.hotels = hotels.iter().map(HotelResult::from_domain).collect();
        }
        ServiceKind::PackageDeal => {
            let listings = state
                .store
                .search_package_deals(&pending.package_query())
                .await?;
            response.package_deals = listings.iter().map(PackageResult::from_domain).collect();
        }
    }

    response.search_token = state.searches.put(pending);
    Ok(Json(response))
}

/// Turn the raw form input into a validated pending search.
fn pending_search(req: SearchRequest) -> Result<PendingSearch, ApiError> {
    if req.guests < 1 {
        return Err(ApiError::BadRequest(format!(
            "number of travellers must be at least 1, got {}",
            req.guests
        )));
    }
    if req.destination.trim().is_empty() {
        return Err(ApiError::BadRequest("destination is required".to_string()));
    }

    match req.booking_type {
        ServiceKind::Flight => {
            if req.departure_date.is_none() {
                return Err(ApiError::BadRequest(
                    "departure date is required for flight searches".to_string(),
                ));
            }
            if req.departure_city.as_deref().unwrap_or("").trim().is_empty() {
                return Err(ApiError::BadRequest(
                    "departure city is required for flight searches".to_string(),
                ));
            }
        }
        ServiceKind::Hotel | ServiceKind::PackageDeal => {
            if req.check_in.is_none() || req.check_out.is_none() {
                return Err(ApiError::BadRequest(
                    "check-in and check-out dates are required".to_string(),
                ));
            }
        }
    }

    let pending = PendingSearch {
        kind: req.booking_type,
        destination: req.destination.trim().to_string(),
        guests: req.guests,
        departure_city: req.departure_city,
        departure_date: req.departure_date,
        check_in: req.check_in,
        check_out: req.check_out,
        min_price: req.min_price,
        max_price: req.max_price,
    };
    pending.validate()?;
    Ok(pending)
}
