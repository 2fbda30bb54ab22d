//! Physical resource counts for a party.
//!
//! Rooms count payers (adults and children); vehicles count bodies (infants
//! included, they still need a seat).

use crate::config::PricingConfig;
use crate::types::PartyComposition;
use serde::{Deserialize, Serialize};

/// Rooms and vehicles a party needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Rooms at the configured occupancy
    pub rooms: u32,
    /// Vehicles at the configured capacity
    pub vehicles: u32,
}

/// Packs parties into rooms and vehicles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationCalculator {
    room_occupancy: u32,
    vehicle_capacity: u32,
}

impl AllocationCalculator {
    /// Creates a calculator; zero sizes are treated as one
    #[must_use]
    pub const fn new(room_occupancy: u32, vehicle_capacity: u32) -> Self {
        Self {
            room_occupancy: if room_occupancy == 0 { 1 } else { room_occupancy },
            vehicle_capacity: if vehicle_capacity == 0 { 1 } else { vehicle_capacity },
        }
    }

    /// Calculator using the configured occupancy and capacity
    #[must_use]
    pub const fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.room_occupancy, config.vehicle_capacity)
    }

    /// `ceil((adults + children) / room_occupancy)`
    #[must_use]
    pub const fn rooms_needed(&self, adults: u32, children: u32) -> u32 {
        adults.saturating_add(children).div_ceil(self.room_occupancy)
    }

    /// `ceil(total_pax / vehicle_capacity)`
    #[must_use]
    pub const fn vehicles_needed(&self, total_pax: u32) -> u32 {
        total_pax.div_ceil(self.vehicle_capacity)
    }

    /// Rooms and vehicles for `party`
    #[must_use]
    pub const fn allocate(&self, party: &PartyComposition) -> Allocation {
        Allocation {
            rooms: self.rooms_needed(party.adults, party.children),
            vehicles: self.vehicles_needed(party.total()),
        }
    }
}

impl Default for AllocationCalculator {
    fn default() -> Self {
        Self::new(2, 4)
    }
}
