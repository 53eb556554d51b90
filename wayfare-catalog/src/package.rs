use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::ServiceCost;
use crate::service::{CatalogError, Flight, Hotel};

/// A flight plus a hotel sold together for a date range.
///
/// The deal references its components by id; both stay independently
/// bookable. `price` is the advertised price pinned when the deal was
/// built — capacity and charged cost are always derived from the live
/// components instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDeal {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub hotel_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    price: f64,
}

impl PackageDeal {
    pub(crate) fn assemble(
        flight_id: Uuid,
        hotel_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_id,
            hotel_id,
            start_date,
            end_date,
            price,
        }
    }

    /// Rebuild a deal from stored fields, re-checking the invariants.
    pub fn restore(
        id: Uuid,
        flight_id: Uuid,
        hotel_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: f64,
    ) -> Result<Self, CatalogError> {
        if end_date < start_date {
            return Err(CatalogError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        if price < 0.0 {
            return Err(CatalogError::NegativePrice(price));
        }
        Ok(Self {
            id,
            flight_id,
            hotel_id,
            start_date,
            end_date,
            price,
        })
    }

    /// Advertised price, pinned at build time.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Sellable capacity: a package can only go as far as its scarcest side.
    pub fn availability(&self, flight: &Flight, hotel: &Hotel) -> i32 {
        flight.availability().min(hotel.availability())
    }

    /// Charged unit cost, derived from the components' current prices.
    pub fn unit_cost(&self, flight: &Flight, hotel: &Hotel) -> f64 {
        flight.unit_cost() + hotel.unit_cost()
    }
}
