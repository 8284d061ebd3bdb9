//! Effective item availability.
//!
//! Availability is never stored; it is derived at render time with a
//! strict three-tier priority:
//!
//! 1. Per-item override (`always-available` / `force-unavailable`).
//! 2. Global "ignore stock levels" kiosk flag.
//! 3. The raw inventory flag on the item.

use crate::model::{AvailabilityOverride, Item, SingleItem};

/// Resolve availability from its three inputs.
pub fn effective_availability(
    availability_override: AvailabilityOverride,
    ignore_stock_levels: bool,
    is_available: bool,
) -> bool {
    match availability_override {
        AvailabilityOverride::AlwaysAvailable => true,
        AvailabilityOverride::ForceUnavailable => false,
        AvailabilityOverride::UseInventory | AvailabilityOverride::Unknown => {
            ignore_stock_levels || is_available
        }
    }
}

impl SingleItem {
    pub fn is_effectively_available(&self, ignore_stock_levels: bool) -> bool {
        effective_availability(
            self.availability_override,
            ignore_stock_levels,
            self.is_available,
        )
    }
}

impl Item {
    /// Item groups carry no inventory flag and are always shown as available.
    pub fn is_effectively_available(&self, ignore_stock_levels: bool) -> bool {
        match self {
            Item::Single(item) => item.is_effectively_available(ignore_stock_levels),
            Item::Group(_) => true,
        }
    }
}
