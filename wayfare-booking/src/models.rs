use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfare_catalog::{AdjustmentPlan, ItemKind, ServiceKind};

/// Booking lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// The inventory a booking consumes, tagged by service kind.
///
/// A package booking snapshots its component ids at creation time. Every
/// later capacity release targets the snapshot, so re-pointing a deal at
/// other components cannot misdirect the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceSelection {
    Flight {
        flight_id: Uuid,
    },
    Hotel {
        hotel_id: Uuid,
    },
    PackageDeal {
        package_deal_id: Uuid,
        flight_id: Uuid,
        hotel_id: Uuid,
    },
}

impl ServiceSelection {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceSelection::Flight { .. } => ServiceKind::Flight,
            ServiceSelection::Hotel { .. } => ServiceKind::Hotel,
            ServiceSelection::PackageDeal { .. } => ServiceKind::PackageDeal,
        }
    }

    /// Ledger plan adjusting every item this selection consumes by `delta`.
    pub fn adjustment_plan(&self, delta: i32) -> AdjustmentPlan {
        match self {
            ServiceSelection::Flight { flight_id } => {
                AdjustmentPlan::new().adjust(ItemKind::Flight, *flight_id, delta)
            }
            ServiceSelection::Hotel { hotel_id } => {
                AdjustmentPlan::new().adjust(ItemKind::Hotel, *hotel_id, delta)
            }
            ServiceSelection::PackageDeal {
                flight_id,
                hotel_id,
                ..
            } => AdjustmentPlan::new()
                .adjust(ItemKind::Flight, *flight_id, delta)
                .adjust(ItemKind::Hotel, *hotel_id, delta),
        }
    }
}

/// A confirmed purchase of capacity on one service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub destination: String,
    pub booking_date: DateTime<Utc>,
    pub num_people: i32,
    pub total_price: f64,
    pub service: ServiceSelection,
    pub status: BookingStatus,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        guest_name: String,
        guest_email: String,
        destination: String,
        booking_date: DateTime<Utc>,
        num_people: i32,
        total_price: f64,
        service: ServiceSelection,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            guest_name,
            guest_email,
            destination,
            booking_date,
            num_people,
            total_price,
            service,
            status: BookingStatus::Confirmed,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn cancel(&mut self) {
        self.status = BookingStatus::Cancelled;
    }
}

/// A registered account bookings are attributed to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_selection_adjusts_both_components() {
        let selection = ServiceSelection::PackageDeal {
            package_deal_id: Uuid::new_v4(),
            flight_id: Uuid::new_v4(),
            hotel_id: Uuid::new_v4(),
        };
        let plan = selection.adjustment_plan(2);
        assert_eq!(plan.entries().len(), 2);
        assert!(plan.entries().iter().all(|entry| entry.delta == 2));
    }

    #[test]
    fn test_flight_selection_adjusts_one_item() {
        let selection = ServiceSelection::Flight {
            flight_id: Uuid::new_v4(),
        };
        assert_eq!(selection.adjustment_plan(-3).entries().len(), 1);
        assert_eq!(selection.adjustment_plan(-3).entries()[0].delta, -3);
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut booking = Booking::new(
            Uuid::new_v4(),
            "Mara Voss".to_string(),
            "mara@example.com".to_string(),
            "Lisbon".to_string(),
            Utc::now(),
            2,
            240.0,
            ServiceSelection::Flight {
                flight_id: Uuid::new_v4(),
            },
        );
        assert!(booking.is_confirmed());
        booking.cancel();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        booking.cancel();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_selection_serializes_with_service_type_tag() {
        let selection = ServiceSelection::Hotel {
            hotel_id: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["service_type"], "HOTEL");
    }
}
