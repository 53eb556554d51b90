use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::{self, ServiceCost};

/// Catalog validation and assembly errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("price cannot be negative: {0}")]
    NegativePrice(f64),

    #[error("availability cannot be negative: {0}")]
    NegativeAvailability(i32),

    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ServiceKind,
        actual: ServiceKind,
    },

    #[error("package deal is missing {0}")]
    IncompleteBuild(&'static str),
}

/// Service kinds sold by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    Flight,
    Hotel,
    PackageDeal,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Flight => write!(f, "flight"),
            ServiceKind::Hotel => write!(f, "hotel"),
            ServiceKind::PackageDeal => write!(f, "package deal"),
        }
    }
}

/// A scheduled flight with sellable seat capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub departure_city: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub flight_number: String,
    availability: i32,
    price: f64,
}

impl Flight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        airline: String,
        departure_city: String,
        destination: String,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
        flight_number: String,
        availability: i32,
        price: f64,
    ) -> Result<Self, CatalogError> {
        Self::restore(
            Uuid::new_v4(),
            airline,
            departure_city,
            destination,
            departure_time,
            arrival_time,
            flight_number,
            availability,
            price,
        )
    }

    /// Rebuild a flight from stored fields, re-checking the invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        airline: String,
        departure_city: String,
        destination: String,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
        flight_number: String,
        availability: i32,
        price: f64,
    ) -> Result<Self, CatalogError> {
        check_availability(availability)?;
        check_price(price)?;
        Ok(Self {
            id,
            airline,
            departure_city,
            destination,
            departure_time,
            arrival_time,
            flight_number,
            availability,
            price,
        })
    }

    pub fn availability(&self) -> i32 {
        self.availability
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn set_availability(&mut self, availability: i32) -> Result<(), CatalogError> {
        check_availability(availability)?;
        self.availability = availability;
        Ok(())
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), CatalogError> {
        check_price(price)?;
        self.price = price;
        Ok(())
    }
}

impl ServiceCost for Flight {
    fn unit_cost(&self) -> f64 {
        pricing::flight_unit_cost(self.price)
    }
}

/// A hotel stay with sellable room capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub rating: i32,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    availability: i32,
    price: f64,
}

impl Hotel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        location: String,
        rating: i32,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
        availability: i32,
        price: f64,
    ) -> Result<Self, CatalogError> {
        Self::restore(
            Uuid::new_v4(),
            name,
            location,
            rating,
            check_in_date,
            check_out_date,
            availability,
            price,
        )
    }

    /// Rebuild a hotel from stored fields, re-checking the invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        name: String,
        location: String,
        rating: i32,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
        availability: i32,
        price: f64,
    ) -> Result<Self, CatalogError> {
        check_availability(availability)?;
        check_price(price)?;
        Ok(Self {
            id,
            name,
            location,
            rating,
            check_in_date,
            check_out_date,
            availability,
            price,
        })
    }

    pub fn availability(&self) -> i32 {
        self.availability
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn set_availability(&mut self, availability: i32) -> Result<(), CatalogError> {
        check_availability(availability)?;
        self.availability = availability;
        Ok(())
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), CatalogError> {
        check_price(price)?;
        self.price = price;
        Ok(())
    }
}

impl ServiceCost for Hotel {
    fn unit_cost(&self) -> f64 {
        pricing::hotel_unit_cost(self.price)
    }
}

/// Either side of a package, as loaded from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelService {
    Flight(Flight),
    Hotel(Hotel),
}

impl TravelService {
    pub fn kind(&self) -> ServiceKind {
        match self {
            TravelService::Flight(_) => ServiceKind::Flight,
            TravelService::Hotel(_) => ServiceKind::Hotel,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            TravelService::Flight(flight) => flight.id,
            TravelService::Hotel(hotel) => hotel.id,
        }
    }

    pub fn availability(&self) -> i32 {
        match self {
            TravelService::Flight(flight) => flight.availability(),
            TravelService::Hotel(hotel) => hotel.availability(),
        }
    }
}

impl ServiceCost for TravelService {
    fn unit_cost(&self) -> f64 {
        match self {
            TravelService::Flight(flight) => flight.unit_cost(),
            TravelService::Hotel(hotel) => hotel.unit_cost(),
        }
    }
}

fn check_price(price: f64) -> Result<(), CatalogError> {
    if price < 0.0 {
        return Err(CatalogError::NegativePrice(price));
    }
    Ok(())
}

fn check_availability(availability: i32) -> Result<(), CatalogError> {
    if availability < 0 {
        return Err(CatalogError::NegativeAvailability(availability));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_flight(availability: i32, price: f64) -> Result<Flight, CatalogError> {
        Flight::new(
            "Aurora Air".to_string(),
            "Oslo".to_string(),
            "Lisbon".to_string(),
            Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 9, 1, 12, 30, 0).unwrap(),
            "AA204".to_string(),
            availability,
            price,
        )
    }

    #[test]
    fn test_negative_price_rejected_at_creation() {
        let result = sample_flight(10, -1.0);
        assert!(matches!(result, Err(CatalogError::NegativePrice(_))));
    }

    #[test]
    fn test_negative_price_rejected_at_mutation() {
        let mut flight = sample_flight(10, 100.0).unwrap();
        let result = flight.set_price(-50.0);
        assert!(matches!(result, Err(CatalogError::NegativePrice(_))));
        assert!((flight.price() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_availability_rejected() {
        let mut flight = sample_flight(10, 100.0).unwrap();
        assert!(flight.set_availability(0).is_ok());
        assert!(matches!(
            flight.set_availability(-1),
            Err(CatalogError::NegativeAvailability(-1))
        ));
        assert_eq!(flight.availability(), 0);
    }

    #[test]
    fn test_service_enum_exposes_kind_and_capacity() {
        let flight = sample_flight(7, 100.0).unwrap();
        let id = flight.id;
        let service = TravelService::Flight(flight);
        assert_eq!(service.kind(), ServiceKind::Flight);
        assert_eq!(service.id(), id);
        assert_eq!(service.availability(), 7);
    }
}
