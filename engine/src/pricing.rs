//! Line pricing.
//!
//! Pure and deterministic: the same item, quantity and nights always resolve
//! to the same price. Three rules, chosen by category:
//!
//! | Rule              | Categories            | Unit                        | Total                |
//! |-------------------|-----------------------|-----------------------------|----------------------|
//! | Flat              | tour, package, craft  | base price                  | unit × quantity      |
//! | Occupancy-tiered  | lodging               | table[guests] or fallback   | unit × nights        |
//! | Passenger-tiered  | transport             | standard or large zone fare | unit × vehicles      |

use crate::allocation::AllocationCalculator;
use crate::config::PricingConfig;
use crate::error::ValidationError;
use crate::types::{CatalogItem, Category, Money, ZoneFare};
use serde::{Deserialize, Serialize};

/// Resolved price of one cart line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePrice {
    /// Price of one unit (guest, night or vehicle)
    pub unit: Money,
    /// Price of the whole line
    pub total: Money,
}

/// Which transport tier a party falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FareTier {
    /// Standard taxis
    Standard,
    /// One large vehicle
    Large,
}

/// Computes unit and total price for a line
#[derive(Debug, Clone)]
pub struct PriceResolver {
    allocation: AllocationCalculator,
    standard_fare_max_party: u32,
    max_zone_party: u32,
}

impl PriceResolver {
    /// Creates a resolver from pricing configuration
    #[must_use]
    pub const fn new(config: &PricingConfig) -> Self {
        Self {
            allocation: AllocationCalculator::from_config(config),
            standard_fare_max_party: config.standard_fare_max_party,
            max_zone_party: config.max_zone_party,
        }
    }

    /// Resolve the price of `quantity` of `item`
    ///
    /// `quantity` is guests for tours, packages and transport, units for
    /// crafts, and guests per room for lodging. `nights` is only read for
    /// lodging.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a zero quantity, a lodging line with
    /// zero nights, a party larger than the zone fare accepts, or overflow.
    pub fn resolve(
        &self,
        item: &CatalogItem,
        quantity: u32,
        nights: u32,
    ) -> Result<LinePrice, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity);
        }

        match item.category {
            Category::Lodging => Self::occupancy_tiered(item, quantity, nights),
            Category::Transport => match item.zone_fare {
                Some(fare) => self.passenger_tiered(fare, quantity),
                None => self.per_vehicle(item.base_price, quantity),
            },
            Category::Tour | Category::Package | Category::Craft => {
                Self::flat(item.base_price, quantity)
            },
        }
    }

    /// Tier a party of `party` falls in; the standard tier boundary is inclusive
    #[must_use]
    pub const fn fare_tier(&self, party: u32) -> FareTier {
        if party <= self.standard_fare_max_party {
            FareTier::Standard
        } else {
            FareTier::Large
        }
    }

    fn flat(base: Money, quantity: u32) -> Result<LinePrice, ValidationError> {
        Ok(LinePrice {
            unit: base,
            total: base
                .checked_multiply(quantity)
                .ok_or(ValidationError::PriceOverflow)?,
        })
    }

    fn occupancy_tiered(
        item: &CatalogItem,
        guests: u32,
        nights: u32,
    ) -> Result<LinePrice, ValidationError> {
        if nights == 0 {
            return Err(ValidationError::NonPositiveNights);
        }
        let guests = item.max_guests.map_or(guests, |max| guests.min(max));
        let unit = item
            .occupancy_prices
            .get(&guests)
            .or_else(|| item.occupancy_prices.values().next_back())
            .copied()
            .unwrap_or(item.base_price);

        Ok(LinePrice {
            unit,
            total: unit
                .checked_multiply(nights)
                .ok_or(ValidationError::PriceOverflow)?,
        })
    }

    fn passenger_tiered(&self, fare: ZoneFare, party: u32) -> Result<LinePrice, ValidationError> {
        if party > self.max_zone_party {
            return Err(ValidationError::PartyTooLarge {
                party,
                max: self.max_zone_party,
            });
        }
        match self.fare_tier(party) {
            FareTier::Standard => {
                let vehicles = self.allocation.vehicles_needed(party);
                Ok(LinePrice {
                    unit: fare.standard,
                    total: fare
                        .standard
                        .checked_multiply(vehicles)
                        .ok_or(ValidationError::PriceOverflow)?,
                })
            },
            FareTier::Large => Ok(LinePrice {
                unit: fare.large,
                total: fare.large,
            }),
        }
    }

    fn per_vehicle(&self, base: Money, party: u32) -> Result<LinePrice, ValidationError> {
        let vehicles = self.allocation.vehicles_needed(party);
        Ok(LinePrice {
            unit: base,
            total: base
                .checked_multiply(vehicles)
                .ok_or(ValidationError::PriceOverflow)?,
        })
    }
}

impl Default for PriceResolver {
    fn default() -> Self {
        Self::new(&crate::config::EngineConfig::default().pricing)
    }
}
