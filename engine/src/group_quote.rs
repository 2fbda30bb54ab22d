//! Single-shot group quote.
//!
//! No day plan: the party is packed into rooms and vehicles and priced at
//! fixed unit rates (a bundled stay of `nights` nights, a tour bundle per
//! paying guest, and transfer legs per vehicle).

use crate::allocation::AllocationCalculator;
use crate::config::{EngineConfig, GroupRates, Margin};
use crate::error::ValidationError;
use crate::types::{Money, PartyComposition};
use serde::{Deserialize, Serialize};

/// Net cost split by concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBreakdown {
    /// Rooms × nightly rate × nights
    pub lodging: Money,
    /// Paying guests × tour rate
    pub tours: Money,
    /// Vehicles × transfer rate × legs
    pub transport: Money,
}

/// Result of a group quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupQuote {
    /// Net cost
    pub net_total: f64,
    /// Sale price
    pub pvp_total: f64,
    /// Sale price minus net cost
    pub margin_value: f64,
    /// Rooms for the party
    pub rooms_needed: u32,
    /// Taxis for the party
    pub taxis_needed: u32,
    /// Party quoted
    pub party: PartyComposition,
    /// Net cost split
    pub breakdown: GroupBreakdown,
}

/// Group quote calculator
#[derive(Debug, Clone)]
pub struct GroupQuoteCalculator {
    allocation: AllocationCalculator,
    rates: GroupRates,
    margin: Margin,
}

impl GroupQuoteCalculator {
    /// Calculator from configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            allocation: AllocationCalculator::from_config(&config.pricing),
            rates: config.group.clone(),
            margin: config.pricing.margin,
        }
    }

    /// Quote `party`
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PriceOverflow`] if costs overflow.
    pub fn quote(&self, party: &PartyComposition) -> Result<GroupQuote, ValidationError> {
        let allocation = self.allocation.allocate(party);
        let overflow = || ValidationError::PriceOverflow;

        let breakdown = GroupBreakdown {
            lodging: self
                .rates
                .room_night
                .checked_multiply(allocation.rooms)
                .and_then(|m| m.checked_multiply(self.rates.nights))
                .ok_or_else(overflow)?,
            tours: self
                .rates
                .tour_per_pax
                .checked_multiply(party.paying())
                .ok_or_else(overflow)?,
            transport: self
                .rates
                .transfer
                .checked_multiply(allocation.vehicles)
                .and_then(|m| m.checked_multiply(self.rates.transfer_legs))
                .ok_or_else(overflow)?,
        };

        let net = Money::checked_sum([breakdown.lodging, breakdown.tours, breakdown.transport])
            .ok_or_else(overflow)?;
        let net_total = net.as_f64();
        let pvp_total = self.margin.apply(net_total);

        Ok(GroupQuote {
            net_total,
            pvp_total,
            margin_value: pvp_total - net_total,
            rooms_needed: allocation.rooms,
            taxis_needed: allocation.vehicles,
            party: *party,
            breakdown,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seventeen_adult_group() {
        let calc = GroupQuoteCalculator::from_config(&EngineConfig::default());
        let party = PartyComposition::new(17, 1, 1).unwrap();
        let quote = calc.quote(&party).unwrap();

        assert_eq!(quote.rooms_needed, 9);
        assert_eq!(quote.taxis_needed, 5);
        assert_eq!(quote.breakdown.lodging, Money::from_pesos(9 * 720_000 * 3));
        assert_eq!(quote.breakdown.tours, Money::from_pesos(18 * 280_000));
        assert_eq!(quote.breakdown.transport, Money::from_pesos(5 * 126_000 * 2));

        let net = f64::from(9 * 720_000 * 3 + 18 * 280_000 + 5 * 126_000 * 2);
        assert!((quote.net_total - net).abs() < 1e-6);
        assert!((quote.margin_value - quote.net_total * 0.20).abs() < 1e-6);
    }
}
