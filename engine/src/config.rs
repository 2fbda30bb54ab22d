//! Configuration management for the engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::types::Money;
use std::env;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Pricing configuration
    pub pricing: PricingConfig,
    /// Capacity gate configuration
    pub capacity: CapacityConfig,
    /// Itinerary configuration
    pub itinerary: ItineraryConfig,
    /// Group quote rates
    pub group: GroupRates,
    /// Payment configuration
    pub payment: PaymentConfig,
    /// Logging configuration
    pub log_level: String,
}

/// Agency margin as a fraction of net cost (0.20 = 20%)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin(f64);

impl Margin {
    /// The agency's standard margin
    pub const DEFAULT: Self = Self(0.20);

    /// Creates a margin, rejecting negative and non-finite fractions
    #[must_use]
    pub fn new(fraction: f64) -> Option<Self> {
        (fraction.is_finite() && fraction >= 0.0).then_some(Self(fraction))
    }

    /// The fraction
    #[must_use]
    pub const fn fraction(self) -> f64 {
        self.0
    }

    /// Net cost plus margin
    #[must_use]
    pub fn apply(self, net: f64) -> f64 {
        net * (1.0 + self.0)
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pricing and allocation constants
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Agency margin
    pub margin: Margin,
    /// Guests packed per room
    pub room_occupancy: u32,
    /// Seats per standard vehicle
    pub vehicle_capacity: u32,
    /// Largest party the standard transport tier covers (inclusive)
    pub standard_fare_max_party: u32,
    /// Largest party a zone fare accepts
    pub max_zone_party: u32,
}

/// Capacity gate configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityConfig {
    /// Capacity reported by the advisory fallback snapshot
    pub fallback_capacity: u32,
    /// Upper bound on any collaborator call
    pub collaborator_timeout: Duration,
}

/// Itinerary configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryConfig {
    /// Longest plan accepted
    pub max_days: u32,
}

/// Fixed unit rates for the single-shot group quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRates {
    /// Per room per night
    pub room_night: Money,
    /// Nights bundled in the quote
    pub nights: u32,
    /// Tour cost per paying guest
    pub tour_per_pax: Money,
    /// Per vehicle per transfer leg
    pub transfer: Money,
    /// Transfer legs (arrival and departure)
    pub transfer_legs: u32,
}

/// Payment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    /// Pesos per USDT for crypto settlement estimates
    pub cop_per_usdt: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Missing or unparsable values fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let parse_u32 = |key: &str, default: u32| {
            parse(key)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(default)
        };
        let parse_positive = |key: &str, default: u32| {
            let value = parse_u32(key, default);
            if value == 0 { default } else { value }
        };
        let parse_money = |key: &str, default: Money| parse(key).map_or(default, Money::from_pesos);

        Self {
            pricing: PricingConfig {
                margin: lookup("BROKER_MARGIN")
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .and_then(Margin::new)
                    .unwrap_or_default(),
                room_occupancy: parse_positive(
                    "BROKER_ROOM_OCCUPANCY",
                    defaults.pricing.room_occupancy,
                ),
                vehicle_capacity: parse_positive(
                    "BROKER_VEHICLE_CAPACITY",
                    defaults.pricing.vehicle_capacity,
                ),
                standard_fare_max_party: parse_u32(
                    "BROKER_STANDARD_FARE_MAX_PARTY",
                    defaults.pricing.standard_fare_max_party,
                ),
                max_zone_party: parse_positive(
                    "BROKER_MAX_ZONE_PARTY",
                    defaults.pricing.max_zone_party,
                ),
            },
            capacity: CapacityConfig {
                fallback_capacity: parse_u32(
                    "BROKER_FALLBACK_CAPACITY",
                    defaults.capacity.fallback_capacity,
                ),
                collaborator_timeout: parse("BROKER_COLLABORATOR_TIMEOUT_MS")
                    .filter(|ms| *ms > 0)
                    .map_or(defaults.capacity.collaborator_timeout, Duration::from_millis),
            },
            itinerary: ItineraryConfig {
                max_days: parse_positive("BROKER_MAX_ITINERARY_DAYS", defaults.itinerary.max_days),
            },
            group: GroupRates {
                room_night: parse_money("BROKER_GROUP_ROOM_NIGHT_RATE", defaults.group.room_night),
                nights: parse_u32("BROKER_GROUP_NIGHTS", defaults.group.nights),
                tour_per_pax: parse_money(
                    "BROKER_GROUP_TOUR_RATE_PER_PAX",
                    defaults.group.tour_per_pax,
                ),
                transfer: parse_money("BROKER_GROUP_TRANSFER_RATE", defaults.group.transfer),
                transfer_legs: parse_u32("BROKER_GROUP_TRANSFER_LEGS", defaults.group.transfer_legs),
            },
            payment: PaymentConfig {
                cop_per_usdt: parse("BROKER_USDT_RATE")
                    .filter(|rate| *rate > 0)
                    .unwrap_or(defaults.payment.cop_per_usdt),
            },
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig {
                margin: Margin::DEFAULT,
                room_occupancy: 2,
                vehicle_capacity: 4,
                standard_fare_max_party: 4,
                max_zone_party: 15,
            },
            capacity: CapacityConfig {
                fallback_capacity: 10,
                collaborator_timeout: Duration::from_millis(5000),
            },
            itinerary: ItineraryConfig { max_days: 15 },
            group: GroupRates {
                room_night: Money::from_pesos(720_000),
                nights: 3,
                tour_per_pax: Money::from_pesos(280_000),
                transfer: Money::from_pesos(126_000),
                transfer_legs: 2,
            },
            payment: PaymentConfig { cop_per_usdt: 4000 },
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(EngineConfig::from_lookup(|_| None), EngineConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("BROKER_MARGIN", "0.15"),
            ("BROKER_VEHICLE_CAPACITY", "6"),
            ("BROKER_COLLABORATOR_TIMEOUT_MS", "250"),
            ("BROKER_GROUP_NIGHTS", "4"),
            ("RUST_LOG", "debug"),
        ]));
        assert!((config.pricing.margin.fraction() - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.pricing.vehicle_capacity, 6);
        assert_eq!(
            config.capacity.collaborator_timeout,
            Duration::from_millis(250)
        );
        assert_eq!(config.group.nights, 4);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("BROKER_MARGIN", "-0.5"),
            ("BROKER_ROOM_OCCUPANCY", "0"),
            ("BROKER_VEHICLE_CAPACITY", "four"),
            ("BROKER_USDT_RATE", "0"),
        ]));
        assert_eq!(config.pricing.margin, Margin::DEFAULT);
        assert_eq!(config.pricing.room_occupancy, 2);
        assert_eq!(config.pricing.vehicle_capacity, 4);
        assert_eq!(config.payment.cop_per_usdt, 4000);

        let config = EngineConfig::from_lookup(lookup(&[("BROKER_MARGIN", "NaN")]));
        assert_eq!(config.pricing.margin, Margin::DEFAULT);
    }

    #[test]
    fn margin_applies_to_net() {
        let margin = Margin::new(0.2).unwrap_or_default();
        assert!((margin.apply(100.0) - 120.0).abs() < 1e-9);
        assert!(Margin::new(f64::INFINITY).is_none());
    }
}
