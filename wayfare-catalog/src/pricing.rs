//! Unit-cost rules for sellable services.
//!
//! Costs are derived from the item's current base price on every call.
//! Package *deals* are the one exception: their advertised price is pinned
//! once by the builder (see `builder.rs`), while the amount charged to a
//! booking is still derived from the components' current prices.

/// Tax applied on top of a flight's base price.
pub const FLIGHT_TAX_RATE: f64 = 0.20;

/// Service charge applied on top of a hotel's base price.
pub const HOTEL_SERVICE_RATE: f64 = 0.10;

/// Capability required of anything the booking flow can price.
pub trait ServiceCost {
    /// Cost of one unit (one seat, one guest) including surcharges.
    fn unit_cost(&self) -> f64;
}

pub fn flight_unit_cost(price: f64) -> f64 {
    price * (1.0 + FLIGHT_TAX_RATE)
}

pub fn hotel_unit_cost(price: f64) -> f64 {
    price * (1.0 + HOTEL_SERVICE_RATE)
}

/// Total charged for a booking: unit cost times the number of travellers.
pub fn booking_total(unit_cost: f64, num_people: i32) -> f64 {
    unit_cost * f64::from(num_people)
}
