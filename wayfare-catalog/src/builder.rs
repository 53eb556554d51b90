use chrono::NaiveDate;
use tracing::debug;

use crate::package::PackageDeal;
use crate::pricing::ServiceCost;
use crate::service::{CatalogError, Flight, Hotel, ServiceKind, TravelService};

/// Staged assembly of a package deal.
///
/// Steps may run in any order, but `calculate_price` needs both components
/// set and `build` refuses until flight, hotel, dates and price are all in
/// place. The price is snapshotted here so later component repricing does
/// not silently change an already advertised deal.
#[derive(Debug, Default)]
pub struct PackageDealBuilder {
    flight: Option<Flight>,
    hotel: Option<Hotel>,
    dates: Option<(NaiveDate, NaiveDate)>,
    price: Option<f64>,
}

impl PackageDealBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flight(mut self, service: &TravelService) -> Result<Self, CatalogError> {
        match service {
            TravelService::Flight(flight) => {
                debug!(flight_id = %flight.id, "package builder: flight set");
                self.flight = Some(flight.clone());
                Ok(self)
            }
            other => Err(CatalogError::TypeMismatch {
                expected: ServiceKind::Flight,
                actual: other.kind(),
            }),
        }
    }

    pub fn set_hotel(mut self, service: &TravelService) -> Result<Self, CatalogError> {
        match service {
            TravelService::Hotel(hotel) => {
                debug!(hotel_id = %hotel.id, "package builder: hotel set");
                self.hotel = Some(hotel.clone());
                Ok(self)
            }
            other => Err(CatalogError::TypeMismatch {
                expected: ServiceKind::Hotel,
                actual: other.kind(),
            }),
        }
    }

    pub fn set_dates(mut self, start: NaiveDate, end: NaiveDate) -> Result<Self, CatalogError> {
        if end < start {
            return Err(CatalogError::InvalidRange { start, end });
        }
        self.dates = Some((start, end));
        Ok(self)
    }

    /// Pin the deal price from the components' costs as of this instant.
    pub fn calculate_price(mut self) -> Result<Self, CatalogError> {
        let flight = self
            .flight
            .as_ref()
            .ok_or(CatalogError::IncompleteBuild("a flight"))?;
        let hotel = self
            .hotel
            .as_ref()
            .ok_or(CatalogError::IncompleteBuild("a hotel"))?;
        let price = flight.unit_cost() + hotel.unit_cost();
        debug!(price, "package builder: price pinned");
        self.price = Some(price);
        Ok(self)
    }

    pub fn build(self) -> Result<PackageDeal, CatalogError> {
        let flight = self.flight.ok_or(CatalogError::IncompleteBuild("a flight"))?;
        let hotel = self.hotel.ok_or(CatalogError::IncompleteBuild("a hotel"))?;
        let (start, end) = self.dates.ok_or(CatalogError::IncompleteBuild("dates"))?;
        let price = self.price.ok_or(CatalogError::IncompleteBuild("a price"))?;
        Ok(PackageDeal::assemble(flight.id, hotel.id, start, end, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn flight_service() -> TravelService {
        TravelService::Flight(
            Flight::new(
                "Aurora Air".to_string(),
                "Oslo".to_string(),
                "Lisbon".to_string(),
                Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 9, 1, 12, 30, 0).unwrap(),
                "AA204".to_string(),
                5,
                100.0,
            )
            .unwrap(),
        )
    }

    fn hotel_service() -> TravelService {
        TravelService::Hotel(
            Hotel::new(
                "Hotel Miradouro".to_string(),
                "Lisbon".to_string(),
                4,
                NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 9, 8).unwrap(),
                5,
                100.0,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_full_build_pins_price() {
        let flight = flight_service();
        let hotel = hotel_service();
        let deal = PackageDealBuilder::new()
            .set_flight(&flight)
            .unwrap()
            .set_hotel(&hotel)
            .unwrap()
            .set_dates(
                NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 9, 8).unwrap(),
            )
            .unwrap()
            .calculate_price()
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(deal.flight_id, flight.id());
        assert_eq!(deal.hotel_id, hotel.id());
        assert!((deal.price() - 230.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_price_without_hotel_is_incomplete() {
        let flight = flight_service();
        let result = PackageDealBuilder::new()
            .set_flight(&flight)
            .unwrap()
            .calculate_price();
        assert!(matches!(result, Err(CatalogError::IncompleteBuild(_))));
    }

    #[test]
    fn test_build_without_price_is_incomplete() {
        let flight = flight_service();
        let hotel = hotel_service();
        let result = PackageDealBuilder::new()
            .set_flight(&flight)
            .unwrap()
            .set_hotel(&hotel)
            .unwrap()
            .set_dates(
                NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 9, 8).unwrap(),
            )
            .unwrap()
            .build();
        assert!(matches!(result, Err(CatalogError::IncompleteBuild(_))));
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let hotel = hotel_service();
        let result = PackageDealBuilder::new().set_flight(&hotel);
        assert!(matches!(
            result,
            Err(CatalogError::TypeMismatch {
                expected: ServiceKind::Flight,
                actual: ServiceKind::Hotel,
            })
        ));
    }

    #[test]
    fn test_reversed_dates_are_rejected() {
        let result = PackageDealBuilder::new().set_dates(
            NaiveDate::from_ymd_opt(2026, 9, 8).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        );
        assert!(matches!(result, Err(CatalogError::InvalidRange { .. })));
    }
}
