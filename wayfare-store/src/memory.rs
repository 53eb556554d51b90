//! In-memory store: the demo backend and the test double.
//!
//! One mutex guards all tables, so every commit is serialized and a plan
//! is validated in full before anything mutates. That gives the same
//! atomicity the Postgres store gets from transactions and row locks.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use wayfare_booking::{
    Booking, BookingStore, CatalogStore, FlightQuery, HotelQuery, PackageListing, PackageQuery,
    StoreError, User, UserStore,
};
use wayfare_catalog::{ledger, AdjustmentPlan, Flight, Hotel, ItemKind, LedgerError, PackageDeal};

#[derive(Default)]
struct Inner {
    flights: HashMap<Uuid, Flight>,
    hotels: HashMap<Uuid, Hotel>,
    package_deals: HashMap<Uuid, PackageDeal>,
    bookings: HashMap<Uuid, Booking>,
    users: HashMap<Uuid, User>,
}

impl Inner {
    /// Validate every plan entry against current counts, then write all of
    /// them. No entry is applied unless all of them fit.
    fn apply_plan(&mut self, plan: &AdjustmentPlan) -> Result<(), StoreError> {
        let mut staged = Vec::with_capacity(plan.entries().len());
        for entry in plan.entries() {
            let current = match entry.kind {
                ItemKind::Flight => self
                    .flights
                    .get(&entry.item_id)
                    .ok_or_else(|| StoreError::NotFound(format!("flight {}", entry.item_id)))?
                    .availability(),
                ItemKind::Hotel => self
                    .hotels
                    .get(&entry.item_id)
                    .ok_or_else(|| StoreError::NotFound(format!("hotel {}", entry.item_id)))?
                    .availability(),
            };
            let next = ledger::apply(current, entry.delta).map_err(|err| match err {
                LedgerError::InsufficientCapacity {
                    requested,
                    available,
                } => StoreError::InsufficientCapacity {
                    item_id: entry.item_id,
                    requested,
                    available,
                },
            })?;
            staged.push((entry.kind, entry.item_id, next));
        }

        for (kind, item_id, next) in staged {
            match kind {
                ItemKind::Flight => {
                    if let Some(flight) = self.flights.get_mut(&item_id) {
                        flight.set_availability(next)?;
                    }
                }
                ItemKind::Hotel => {
                    if let Some(hotel) = self.hotels.get_mut(&item_id) {
                        hotel.set_availability(next)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn listing(&self, deal: &PackageDeal) -> Option<PackageListing> {
        let flight = self.flights.get(&deal.flight_id)?.clone();
        let hotel = self.hotels.get(&deal.hotel_id)?.clone();
        Some(PackageListing {
            deal: deal.clone(),
            flight,
            hotel,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.flights.contains_key(&flight.id) {
            return Err(StoreError::NotFound(format!("flight {}", flight.id)));
        }
        inner.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn delete_flight(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .flights
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("flight {id}")))
    }

    async fn flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.flights.get(&id).cloned())
    }

    async fn list_flights(&self) -> Result<Vec<Flight>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.flights.values().cloned().collect())
    }

    async fn insert_hotel(&self, hotel: &Hotel) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.hotels.insert(hotel.id, hotel.clone());
        Ok(())
    }

    async fn update_hotel(&self, hotel: &Hotel) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.hotels.contains_key(&hotel.id) {
            return Err(StoreError::NotFound(format!("hotel {}", hotel.id)));
        }
        inner.hotels.insert(hotel.id, hotel.clone());
        Ok(())
    }

    async fn delete_hotel(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .hotels
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("hotel {id}")))
    }

    async fn hotel(&self, id: Uuid) -> Result<Option<Hotel>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.hotels.get(&id).cloned())
    }

    async fn list_hotels(&self) -> Result<Vec<Hotel>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.hotels.values().cloned().collect())
    }

    async fn insert_package_deal(&self, deal: &PackageDeal) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.flights.contains_key(&deal.flight_id) {
            return Err(StoreError::NotFound(format!("flight {}", deal.flight_id)));
        }
        if !inner.hotels.contains_key(&deal.hotel_id) {
            return Err(StoreError::NotFound(format!("hotel {}", deal.hotel_id)));
        }
        inner.package_deals.insert(deal.id, deal.clone());
        Ok(())
    }

    async fn delete_package_deal(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .package_deals
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("package deal {id}")))
    }

    async fn package_deal(&self, id: Uuid) -> Result<Option<PackageDeal>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.package_deals.get(&id).cloned())
    }

    async fn package_listing(&self, id: Uuid) -> Result<Option<PackageListing>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .package_deals
            .get(&id)
            .and_then(|deal| inner.listing(deal)))
    }

    async fn list_package_deals(&self) -> Result<Vec<PackageListing>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .package_deals
            .values()
            .filter_map(|deal| inner.listing(deal))
            .collect())
    }

    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .flights
            .values()
            .filter(|flight| query.matches(flight))
            .cloned()
            .collect())
    }

    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<Hotel>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .hotels
            .values()
            .filter(|hotel| query.matches(hotel))
            .cloned()
            .collect())
    }

    async fn search_package_deals(
        &self,
        query: &PackageQuery,
    ) -> Result<Vec<PackageListing>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .package_deals
            .values()
            .filter_map(|deal| inner.listing(deal))
            .filter(|listing| query.matches(&listing.deal, &listing.flight, &listing.hotel))
            .collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.bookings.get(&id).cloned())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bookings
            .values()
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.bookings.values().cloned().collect())
    }

    async fn create_booking(
        &self,
        booking: &Booking,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.bookings.contains_key(&booking.id) {
            return Err(StoreError::Duplicate(format!("booking {}", booking.id)));
        }
        inner.apply_plan(plan)?;
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn resize_booking(
        &self,
        id: Uuid,
        num_people: i32,
        total_price: f64,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let confirmed = inner
            .bookings
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {id}")))?
            .is_confirmed();
        if !confirmed {
            return Err(StoreError::Conflict(format!("booking {id} is not confirmed")));
        }
        inner.apply_plan(plan)?;
        let booking = inner.bookings.get_mut(&id).expect("checked above");
        booking.num_people = num_people;
        booking.total_price = total_price;
        Ok(())
    }

    async fn cancel_booking(&self, id: Uuid, plan: &AdjustmentPlan) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let confirmed = inner
            .bookings
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {id}")))?
            .is_confirmed();
        if !confirmed {
            return Ok(false);
        }
        inner.apply_plan(plan)?;
        inner.bookings.get_mut(&id).expect("checked above").cancel();
        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        if inner
            .users
            .values()
            .any(|existing| existing.id != user.id && existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use wayfare_booking::ServiceSelection;

    fn flight(seats: i32) -> Flight {
        Flight::new(
            "Aurora Air".to_string(),
            "Oslo".to_string(),
            "Lisbon".to_string(),
            Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 9, 1, 12, 30, 0).unwrap(),
            "AA204".to_string(),
            seats,
            100.0,
        )
        .unwrap()
    }

    fn hotel(rooms: i32) -> Hotel {
        Hotel::new(
            "Hotel Miradouro".to_string(),
            "Lisbon".to_string(),
            4,
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 8).unwrap(),
            rooms,
            100.0,
        )
        .unwrap()
    }

    fn booking_of(selection: ServiceSelection, num_people: i32) -> Booking {
        Booking::new(
            Uuid::new_v4(),
            "Mara Voss".to_string(),
            "mara@example.com".to_string(),
            "Lisbon".to_string(),
            Utc::now(),
            num_people,
            360.0,
            selection,
        )
    }

    #[tokio::test]
    async fn test_compound_plan_failure_leaves_both_sides_untouched() {
        let store = MemoryStore::new();
        let flight = flight(5);
        let hotel = hotel(1);
        store.insert_flight(&flight).await.unwrap();
        store.insert_hotel(&hotel).await.unwrap();

        let selection = ServiceSelection::PackageDeal {
            package_deal_id: Uuid::new_v4(),
            flight_id: flight.id,
            hotel_id: hotel.id,
        };
        let booking = booking_of(selection, 3);
        let result = store
            .create_booking(&booking, &selection.adjustment_plan(3))
            .await;

        // The hotel leg cannot fit, so the flight leg must not have moved.
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCapacity { .. })
        ));
        assert_eq!(store.flight(flight.id).await.unwrap().unwrap().availability(), 5);
        assert_eq!(store.hotel(hotel.id).await.unwrap().unwrap().availability(), 1);
        assert!(store.booking(booking.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_reports_false_once_cancelled() {
        let store = MemoryStore::new();
        let flight = flight(5);
        store.insert_flight(&flight).await.unwrap();

        let selection = ServiceSelection::Flight {
            flight_id: flight.id,
        };
        let booking = booking_of(selection, 2);
        store
            .create_booking(&booking, &selection.adjustment_plan(2))
            .await
            .unwrap();

        let release = selection.adjustment_plan(-2);
        assert!(store.cancel_booking(booking.id, &release).await.unwrap());
        assert!(!store.cancel_booking(booking.id, &release).await.unwrap());
        // Released exactly once.
        assert_eq!(store.flight(flight.id).await.unwrap().unwrap().availability(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let user = User::new("Mara Voss".to_string(), "mara@example.com".to_string());
        store.insert_user(&user).await.unwrap();

        let twin = User::new("Other".to_string(), "MARA@example.com".to_string());
        assert!(matches!(
            store.insert_user(&twin).await,
            Err(StoreError::Duplicate(_))
        ));
    }
}
