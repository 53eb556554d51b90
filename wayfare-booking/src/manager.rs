use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use wayfare_catalog::{pricing, ServiceCost};

use crate::models::{Booking, ServiceSelection};
use crate::repository::{StoreError, TravelStore};

/// Booking lifecycle failures
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("number of travellers must be at least 1, got {0}")]
    InvalidGuestCount(i32),

    #[error("invalid service reference: {0}")]
    InvalidServiceReference(String),

    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: i32, available: i32 },

    #[error("booking {0} not found")]
    NotFound(Uuid),

    #[error("booking {0} is cancelled")]
    BookingCancelled(Uuid),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientCapacity {
                requested,
                available,
                ..
            } => BookingError::InsufficientCapacity {
                requested,
                available,
            },
            StoreError::NotFound(what) => BookingError::InvalidServiceReference(what),
            StoreError::Conflict(what) => BookingError::InvalidState(what),
            StoreError::Duplicate(what) => BookingError::Persistence(what),
            StoreError::Persistence(what) => BookingError::Persistence(what),
        }
    }
}

/// The service a booking request points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceChoice {
    Flight(Uuid),
    Hotel(Uuid),
    PackageDeal(Uuid),
}

/// Everything needed to open a booking
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub user_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub destination: String,
    pub booking_date: DateTime<Utc>,
    pub service: ServiceChoice,
    pub num_people: i32,
}

/// Result of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
}

/// Drives bookings through their lifecycle against a backing store.
///
/// Availability is never mutated here: each transition builds an
/// adjustment plan and the store applies it atomically with the booking
/// row, so inventory and bookings stay mutually consistent even when a
/// commit fails halfway.
pub struct BookingManager {
    store: Arc<dyn TravelStore>,
}

impl BookingManager {
    pub fn new(store: Arc<dyn TravelStore>) -> Self {
        Self { store }
    }

    /// Open a booking in the confirmed state, reserving capacity on every
    /// item the chosen service consumes.
    pub async fn create(&self, request: CreateBooking) -> Result<Booking, BookingError> {
        if request.num_people < 1 {
            return Err(BookingError::InvalidGuestCount(request.num_people));
        }

        let (selection, unit_cost) = self.resolve(request.service).await?;
        let total_price = pricing::booking_total(unit_cost, request.num_people);
        let booking = Booking::new(
            request.user_id,
            request.guest_name,
            request.guest_email,
            request.destination,
            request.booking_date,
            request.num_people,
            total_price,
            selection,
        );

        let plan = selection.adjustment_plan(request.num_people);
        self.store.create_booking(&booking, &plan).await?;

        info!(
            booking_id = %booking.id,
            kind = %selection.kind(),
            num_people = request.num_people,
            total_price,
            "booking confirmed"
        );
        Ok(booking)
    }

    /// Change the head count of a confirmed booking. The capacity delta is
    /// checked against current availability; on failure the booking is
    /// left exactly as it was.
    pub async fn resize(
        &self,
        booking_id: Uuid,
        new_num_people: i32,
    ) -> Result<Booking, BookingError> {
        if new_num_people < 1 {
            return Err(BookingError::InvalidGuestCount(new_num_people));
        }

        let mut booking = self
            .store
            .booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound(booking_id))?;
        if !booking.is_confirmed() {
            return Err(BookingError::BookingCancelled(booking_id));
        }

        let delta = new_num_people - booking.num_people;
        if delta == 0 {
            return Ok(booking);
        }

        let unit_cost = self.current_unit_cost(&booking.service).await?;
        let total_price = pricing::booking_total(unit_cost, new_num_people);
        let plan = booking.service.adjustment_plan(delta);
        self.store
            .resize_booking(booking_id, new_num_people, total_price, &plan)
            .await?;

        booking.num_people = new_num_people;
        booking.total_price = total_price;
        info!(
            booking_id = %booking_id,
            delta,
            num_people = new_num_people,
            total_price,
            "booking resized"
        );
        Ok(booking)
    }

    /// Cancel a booking, releasing the capacity it held. Cancelling twice
    /// is a reported no-op.
    pub async fn cancel(&self, booking_id: Uuid) -> Result<CancelOutcome, BookingError> {
        let booking = self
            .store
            .booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound(booking_id))?;
        if !booking.is_confirmed() {
            info!(booking_id = %booking_id, "booking already cancelled");
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let plan = booking.service.adjustment_plan(-booking.num_people);
        let newly_cancelled = self.store.cancel_booking(booking_id, &plan).await?;
        if !newly_cancelled {
            info!(booking_id = %booking_id, "booking already cancelled");
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        info!(
            booking_id = %booking_id,
            released = booking.num_people,
            "booking cancelled"
        );
        Ok(CancelOutcome::Cancelled)
    }

    /// Resolve a requested service into the selection snapshot a booking
    /// stores, plus its current unit cost.
    async fn resolve(
        &self,
        choice: ServiceChoice,
    ) -> Result<(ServiceSelection, f64), BookingError> {
        match choice {
            ServiceChoice::Flight(id) => {
                let flight = self.store.flight(id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("flight {id}"))
                })?;
                Ok((
                    ServiceSelection::Flight { flight_id: flight.id },
                    flight.unit_cost(),
                ))
            }
            ServiceChoice::Hotel(id) => {
                let hotel = self.store.hotel(id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("hotel {id}"))
                })?;
                Ok((
                    ServiceSelection::Hotel { hotel_id: hotel.id },
                    hotel.unit_cost(),
                ))
            }
            ServiceChoice::PackageDeal(id) => {
                let listing = self.store.package_listing(id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("package deal {id}"))
                })?;
                let selection = ServiceSelection::PackageDeal {
                    package_deal_id: listing.deal.id,
                    flight_id: listing.flight.id,
                    hotel_id: listing.hotel.id,
                };
                Ok((selection, listing.unit_cost()))
            }
        }
    }

    /// Current unit cost of the service a booking already holds. Package
    /// bookings price against their snapshotted components, at those
    /// components' current prices.
    async fn current_unit_cost(&self, selection: &ServiceSelection) -> Result<f64, BookingError> {
        match selection {
            ServiceSelection::Flight { flight_id } => {
                let flight = self.store.flight(*flight_id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("flight {flight_id}"))
                })?;
                Ok(flight.unit_cost())
            }
            ServiceSelection::Hotel { hotel_id } => {
                let hotel = self.store.hotel(*hotel_id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("hotel {hotel_id}"))
                })?;
                Ok(hotel.unit_cost())
            }
            ServiceSelection::PackageDeal {
                flight_id,
                hotel_id,
                ..
            } => {
                let flight = self.store.flight(*flight_id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("flight {flight_id}"))
                })?;
                let hotel = self.store.hotel(*hotel_id).await?.ok_or_else(|| {
                    BookingError::InvalidServiceReference(format!("hotel {hotel_id}"))
                })?;
                Ok(flight.unit_cost() + hotel.unit_cost())
            }
        }
    }
}
