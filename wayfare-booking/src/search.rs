use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use wayfare_catalog::{CatalogError, Flight, Hotel, PackageDeal, ServiceKind};

/// What a visitor asked for, carried from the search step to the booking
/// step as an explicit value instead of ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSearch {
    pub kind: ServiceKind,
    pub destination: String,
    pub guests: i32,
    pub departure_city: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PendingSearch {
    /// Cross-field checks the form layer cannot express.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) {
            if check_out < check_in {
                return Err(CatalogError::InvalidRange {
                    start: check_in,
                    end: check_out,
                });
            }
        }
        Ok(())
    }

    pub fn flight_query(&self) -> FlightQuery {
        FlightQuery {
            destination_contains: self.destination.clone(),
            departure_city_contains: self.departure_city.clone(),
            departing_on_or_after: self.departure_date,
            min_seats: self.guests,
        }
    }

    pub fn hotel_query(&self) -> HotelQuery {
        HotelQuery {
            location_contains: self.destination.clone(),
            min_rooms: self.guests,
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    pub fn package_query(&self) -> PackageQuery {
        PackageQuery {
            destination_contains: self.destination.clone(),
            min_capacity: self.guests,
            check_in: self.check_in,
            check_out: self.check_out,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlightQuery {
    pub destination_contains: String,
    pub departure_city_contains: Option<String>,
    pub departing_on_or_after: Option<NaiveDate>,
    pub min_seats: i32,
}

impl FlightQuery {
    pub fn matches(&self, flight: &Flight) -> bool {
        if !contains_ci(&flight.destination, &self.destination_contains) {
            return false;
        }
        if let Some(city) = &self.departure_city_contains {
            if !contains_ci(&flight.departure_city, city) {
                return false;
            }
        }
        if let Some(date) = self.departing_on_or_after {
            if flight.departure_time.date_naive() < date {
                return false;
            }
        }
        flight.availability() >= self.min_seats
    }
}

#[derive(Debug, Clone, Default)]
pub struct HotelQuery {
    pub location_contains: String,
    pub min_rooms: i32,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

impl HotelQuery {
    pub fn matches(&self, hotel: &Hotel) -> bool {
        if !contains_ci(&hotel.location, &self.location_contains) {
            return false;
        }
        // The hotel's bookable window must cover the requested stay.
        if let Some(check_in) = self.check_in {
            if hotel.check_in_date > check_in {
                return false;
            }
        }
        if let Some(check_out) = self.check_out {
            if hotel.check_out_date < check_out {
                return false;
            }
        }
        hotel.availability() >= self.min_rooms
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageQuery {
    pub destination_contains: String,
    pub min_capacity: i32,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PackageQuery {
    pub fn matches(&self, deal: &PackageDeal, flight: &Flight, hotel: &Hotel) -> bool {
        if !contains_ci(&flight.destination, &self.destination_contains)
            || !contains_ci(&hotel.location, &self.destination_contains)
        {
            return false;
        }
        if flight.availability() < self.min_capacity || hotel.availability() < self.min_capacity {
            return false;
        }
        if let Some(check_in) = self.check_in {
            if deal.start_date > check_in {
                return false;
            }
        }
        if let Some(check_out) = self.check_out {
            if deal.end_date < check_out {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if deal.price() < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if deal.price() > max {
                return false;
            }
        }
        true
    }
}

/// A deal joined with its live components, ready for display and booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageListing {
    pub deal: PackageDeal,
    pub flight: Flight,
    pub hotel: Hotel,
}

impl PackageListing {
    pub fn availability(&self) -> i32 {
        self.deal.availability(&self.flight, &self.hotel)
    }

    pub fn unit_cost(&self) -> f64 {
        self.deal.unit_cost(&self.flight, &self.hotel)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
