//! Capacity adjustments applied when bookings are created, resized or
//! cancelled.
//!
//! A booking operation never mutates availability directly. It builds an
//! [`AdjustmentPlan`] describing every item it touches, and hands the plan
//! to the store, which must apply all entries and the booking-row write as
//! one atomic unit. Package operations therefore carry a two-entry plan
//! (flight and hotel, same quantity) that can never half-apply.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: i32, available: i32 },
}

/// Which inventory table an adjustment touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Flight,
    Hotel,
}

/// One signed capacity adjustment. Positive delta consumes availability
/// (a reservation), negative delta returns it (a release).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub kind: ItemKind,
    pub item_id: Uuid,
    pub delta: i32,
}

/// The full set of adjustments one booking operation applies atomically.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentPlan {
    entries: Vec<Adjustment>,
}

impl AdjustmentPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(self, kind: ItemKind, item_id: Uuid, quantity: i32) -> Self {
        self.adjust(kind, item_id, quantity)
    }

    pub fn release(self, kind: ItemKind, item_id: Uuid, quantity: i32) -> Self {
        self.adjust(kind, item_id, -quantity)
    }

    /// Signed adjustment; a zero delta is a no-op and adds no entry.
    pub fn adjust(mut self, kind: ItemKind, item_id: Uuid, delta: i32) -> Self {
        if delta != 0 {
            self.entries.push(Adjustment {
                kind,
                item_id,
                delta,
            });
        }
        self
    }

    pub fn entries(&self) -> &[Adjustment] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply one adjustment to a current availability count.
///
/// The count can never go negative: a reservation larger than the current
/// availability fails, and the caller must abandon the whole plan.
pub fn apply(availability: i32, delta: i32) -> Result<i32, LedgerError> {
    let next = availability - delta;
    if next < 0 {
        return Err(LedgerError::InsufficientCapacity {
            requested: delta,
            available: availability,
        });
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_then_release_round_trips() {
        let after_reserve = apply(5, 3).unwrap();
        assert_eq!(after_reserve, 2);
        let after_release = apply(after_reserve, -3).unwrap();
        assert_eq!(after_release, 5);
    }

    #[test]
    fn test_overdrawn_reserve_fails() {
        let result = apply(2, 3);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientCapacity {
                requested: 3,
                available: 2,
            })
        );
    }

    #[test]
    fn test_exact_drain_is_allowed() {
        assert_eq!(apply(3, 3).unwrap(), 0);
    }

    #[test]
    fn test_zero_delta_adds_no_entry() {
        let plan = AdjustmentPlan::new().adjust(ItemKind::Flight, Uuid::new_v4(), 0);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_package_plan_carries_both_sides() {
        let flight_id = Uuid::new_v4();
        let hotel_id = Uuid::new_v4();
        let plan = AdjustmentPlan::new()
            .reserve(ItemKind::Flight, flight_id, 2)
            .reserve(ItemKind::Hotel, hotel_id, 2);

        let entries = plan.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ItemKind::Flight);
        assert_eq!(entries[0].delta, 2);
        assert_eq!(entries[1].kind, ItemKind::Hotel);
        assert_eq!(entries[1].delta, 2);
    }

    #[test]
    fn test_release_negates_quantity() {
        let plan = AdjustmentPlan::new().release(ItemKind::Hotel, Uuid::new_v4(), 4);
        assert_eq!(plan.entries()[0].delta, -4);
    }
}
