//! Store boundaries the booking lifecycle runs against.
//!
//! The commit methods take a whole [`AdjustmentPlan`] next to the booking
//! mutation: an implementation must apply every plan entry and the row
//! write as one atomic unit, or nothing at all. Concurrent commits against
//! the same item must serialize so no two of them observe the same stale
//! availability.

use async_trait::async_trait;
use uuid::Uuid;

use wayfare_catalog::{AdjustmentPlan, CatalogError, Flight, Hotel, PackageDeal};

use crate::models::{Booking, User};
use crate::search::{FlightQuery, HotelQuery, PackageListing, PackageQuery};

/// Store-level failures surfaced to the lifecycle layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient capacity on {item_id}: requested {requested}, available {available}")]
    InsufficientCapacity {
        item_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn persistence<E: std::fmt::Display>(err: E) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

// A stored row that no longer passes domain validation is corrupt data,
// not a validation failure of the current request.
impl From<CatalogError> for StoreError {
    fn from(err: CatalogError) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

/// Inventory and package catalog access
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_flight(&self, flight: &Flight) -> Result<(), StoreError>;
    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError>;
    async fn delete_flight(&self, id: Uuid) -> Result<(), StoreError>;
    async fn flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError>;
    async fn list_flights(&self) -> Result<Vec<Flight>, StoreError>;

    async fn insert_hotel(&self, hotel: &Hotel) -> Result<(), StoreError>;
    async fn update_hotel(&self, hotel: &Hotel) -> Result<(), StoreError>;
    async fn delete_hotel(&self, id: Uuid) -> Result<(), StoreError>;
    async fn hotel(&self, id: Uuid) -> Result<Option<Hotel>, StoreError>;
    async fn list_hotels(&self) -> Result<Vec<Hotel>, StoreError>;

    async fn insert_package_deal(&self, deal: &PackageDeal) -> Result<(), StoreError>;
    async fn delete_package_deal(&self, id: Uuid) -> Result<(), StoreError>;
    async fn package_deal(&self, id: Uuid) -> Result<Option<PackageDeal>, StoreError>;
    /// Deal joined with its current components; `None` when the deal or
    /// either component is gone.
    async fn package_listing(&self, id: Uuid) -> Result<Option<PackageListing>, StoreError>;
    async fn list_package_deals(&self) -> Result<Vec<PackageListing>, StoreError>;

    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>, StoreError>;
    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<Hotel>, StoreError>;
    async fn search_package_deals(
        &self,
        query: &PackageQuery,
    ) -> Result<Vec<PackageListing>, StoreError>;
}

/// Booking rows plus the atomic ledger commits
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;
    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;
    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError>;

    /// Persist a new confirmed booking and apply its reservation plan.
    /// Fails `InsufficientCapacity` (nothing applied) when any plan entry
    /// overdraws an item.
    async fn create_booking(
        &self,
        booking: &Booking,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError>;

    /// Update head count and total price and apply the delta plan, all in
    /// one unit. Fails `Conflict` when the booking is no longer confirmed.
    async fn resize_booking(
        &self,
        id: Uuid,
        num_people: i32,
        total_price: f64,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError>;

    /// Flip the booking to cancelled and apply the release plan. Returns
    /// `false` without applying the plan when the booking was already
    /// cancelled, so a lost cancellation race cannot release twice.
    async fn cancel_booking(&self, id: Uuid, plan: &AdjustmentPlan) -> Result<bool, StoreError>;
}

/// Account access for the session layer
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails `Duplicate` when the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    /// Fails `Duplicate` when the new email belongs to another account.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Everything the application needs from one backing store.
pub trait TravelStore: CatalogStore + BookingStore + UserStore {}

impl<T: CatalogStore + BookingStore + UserStore> TravelStore for T {}
