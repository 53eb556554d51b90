use axum::{
    extract::{Path, State},
    routing::{patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfare_booking::{
    Booking, BookingStore, CancelOutcome, CreateBooking, ServiceChoice,
};
use wayfare_catalog::ServiceKind;

use crate::auth::{current_user, TokenClaims};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    search_token: Uuid,
    item_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ResizeBookingRequest {
    num_people: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub service_type: ServiceKind,
    pub destination: String,
    pub booking_date: DateTime<Utc>,
    pub num_people: i32,
    pub total_price: f64,
    pub status: wayfare_booking::BookingStatus,
}

impl BookingResponse {
    pub fn from_domain(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            service_type: booking.service.kind(),
            destination: booking.destination.clone(),
            booking_date: booking.booking_date,
            num_people: booking.num_people,
            total_price: booking.total_price,
            status: booking.status,
        }
    }
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    booking_id: Uuid,
    outcome: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(my_bookings))
        .route("/v1/bookings/{id}", patch(resize_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let search = state.searches.get(req.search_token).ok_or_else(|| {
        ApiError::Gone("search has expired, please search again".to_string())
    })?;
    let user = current_user(&state, &claims).await?;

    let service = match search.kind {
        ServiceKind::Flight => ServiceChoice::Flight(req.item_id),
        ServiceKind::Hotel => ServiceChoice::Hotel(req.item_id),
        ServiceKind::PackageDeal => ServiceChoice::PackageDeal(req.item_id),
    };
    let booking = state
        .manager
        .create(CreateBooking {
            user_id: user.id,
            guest_name: user.name,
            guest_email: user.email,
            destination: search.destination.clone(),
            booking_date: Utc::now(),
            service,
            num_people: search.guests,
        })
        .await?;

    Ok(Json(BookingResponse::from_domain(&booking)))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let user = current_user(&state, &claims).await?;
    let bookings = state.store.bookings_for_user(user.id).await?;
    Ok(Json(
        bookings.iter().map(BookingResponse::from_domain).collect(),
    ))
}

async fn resize_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResizeBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = current_user(&state, &claims).await?;
    owned_booking(&state, id, user.id).await?;

    let booking = state.manager.resize(id, req.num_people).await?;
    Ok(Json(BookingResponse::from_domain(&booking)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let user = current_user(&state, &claims).await?;
    owned_booking(&state, id, user.id).await?;

    let outcome = state.manager.cancel(id).await?;
    Ok(Json(CancelResponse {
        booking_id: id,
        outcome: match outcome {
            CancelOutcome::Cancelled => "CANCELLED",
            CancelOutcome::AlreadyCancelled => "ALREADY_CANCELLED",
        },
    }))
}

/// A customer may only touch their own bookings; anyone else gets the same
/// answer as for a booking that does not exist.
async fn owned_booking(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Booking, ApiError> {
    let booking = state
        .store
        .booking(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("booking {id} not found")))?;
    if booking.user_id != user_id {
        return Err(ApiError::NotFound(format!("booking {id} not found")));
    }
    Ok(booking)
}
