//! Pricing and allocation laws.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use tourbroker_engine::pricing::FareTier;
use tourbroker_engine::{
    AddLine, AllocationCalculator, Cart, CatalogItem, Category, EngineConfig, GroupQuoteCalculator,
    ItineraryAggregator, ItineraryPlan, LineId, Margin, Money, PartyComposition, PriceResolver,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

fn tour(price: u64) -> CatalogItem {
    CatalogItem::new("tour", "Tour", Category::Tour, Money::from_pesos(price))
}

fn posada() -> CatalogItem {
    CatalogItem::new("posada", "Posada", Category::Lodging, Money::from_pesos(200))
        .with_occupancy_price(1, Money::from_pesos(150))
        .with_occupancy_price(2, Money::from_pesos(180))
        .with_max_guests(4)
}

fn taxi() -> CatalogItem {
    CatalogItem::new("taxi", "Taxi", Category::Transport, Money::from_pesos(50_000))
        .with_zone_fare(Money::from_pesos(50_000), Money::from_pesos(70_000))
}

fn party() -> impl Strategy<Value = PartyComposition> {
    (1u32..60, 0u32..30, 0u32..10).prop_map(|(a, c, i)| PartyComposition::new(a, c, i).unwrap())
}

proptest! {
    #[test]
    fn rooms_count_payers_only(adults in 1u32..200, children in 0u32..100, infants in 0u32..50) {
        let calc = AllocationCalculator::default();
        let with = calc.allocate(&PartyComposition::new(adults, children, infants).unwrap());
        let without = calc.allocate(&PartyComposition::new(adults, children, 0).unwrap());
        prop_assert_eq!(with.rooms, (adults + children).div_ceil(2));
        prop_assert_eq!(with.rooms, without.rooms);
    }

    #[test]
    fn vehicles_count_every_body(adults in 1u32..200, children in 0u32..100, infants in 0u32..50) {
        let calc = AllocationCalculator::default();
        let allocation = calc.allocate(&PartyComposition::new(adults, children, infants).unwrap());
        prop_assert_eq!(allocation.vehicles, (adults + children + infants).div_ceil(4));
    }

    #[test]
    fn itinerary_margin_is_consistent(
        party in party(),
        prices in proptest::collection::vec(1u64..500_000, 1..8),
        margin in 0.0f64..1.0,
    ) {
        let start = base_date();
        let end = start.checked_add_days(Days::new(6)).unwrap();
        let mut plan = ItineraryPlan::new(start, end, 15).unwrap();
        for (offset, price) in prices.iter().enumerate() {
            let date = start.checked_add_days(Days::new(offset as u64 % 7)).unwrap();
            plan.add_item(date, tour(*price)).unwrap();
        }
        let margin = Margin::new(margin).unwrap();
        let quote = ItineraryAggregator::from_config(&EngineConfig::default())
            .quote_with_margin(&plan, &party, margin)
            .unwrap();

        let expected = quote.net_total * margin.fraction();
        prop_assert!((quote.margin_value - expected).abs() < 1e-6 * quote.net_total.max(1.0));
        prop_assert!((quote.pvp_total - quote.net_total - expected).abs() < 1e-6 * quote.net_total.max(1.0));
    }

    #[test]
    fn resolving_twice_gives_the_same_price(quantity in 1u32..15, nights in 1u32..10) {
        let resolver = PriceResolver::default();
        for item in [tour(85_000), posada(), taxi()] {
            let first = resolver.resolve(&item, quantity, nights).unwrap();
            let second = resolver.resolve(&item, quantity, nights).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn same_slot_adds_merge(q1 in 1u32..50, q2 in 1u32..50, price in 1u64..1_000_000) {
        let resolver = PriceResolver::default();
        let item = tour(price);
        let mut cart = Cart::new();
        let first = cart
            .add(LineId::new(), &item, &AddLine::new(q1, base_date()).at("09:00"), &resolver)
            .unwrap();
        let second = cart
            .add(LineId::new(), &item, &AddLine::new(q2, base_date()).at("09:00"), &resolver)
            .unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(cart.lines().len(), 1);
        let line = cart.line(first).unwrap();
        prop_assert_eq!(line.quantity, q1 + q2);
        prop_assert_eq!(line.total_price, Money::from_pesos(price * u64::from(q1 + q2)));
    }

    #[test]
    fn lodging_never_merges_across_dates(guests in 1u32..4, nights in 1u32..5, gap in 1u64..30) {
        let resolver = PriceResolver::default();
        let mut cart = Cart::new();
        let later = base_date().checked_add_days(Days::new(gap)).unwrap();
        cart.add(LineId::new(), &posada(), &AddLine::new(guests, base_date()).for_nights(nights), &resolver)
            .unwrap();
        cart.add(LineId::new(), &posada(), &AddLine::new(guests, later).for_nights(nights), &resolver)
            .unwrap();
        prop_assert_eq!(cart.lines().len(), 2);
    }
}

#[test]
fn group_of_seventeen_adults() {
    let party = PartyComposition::new(17, 1, 1).unwrap();
    let allocation = AllocationCalculator::default().allocate(&party);
    assert_eq!(allocation.rooms, 9);
    assert_eq!(allocation.vehicles, 5);

    let quote = GroupQuoteCalculator::from_config(&EngineConfig::default())
        .quote(&party)
        .unwrap();
    assert_eq!(quote.rooms_needed, 9);
    assert_eq!(quote.taxis_needed, 5);
    assert!((quote.pvp_total - quote.net_total * 1.2).abs() < 1e-6);
}

#[test]
fn zone_fare_tier_boundary() {
    let resolver = PriceResolver::default();
    assert_eq!(resolver.fare_tier(4), FareTier::Standard);
    assert_eq!(resolver.fare_tier(5), FareTier::Large);

    let four = resolver.resolve(&taxi(), 4, 0).unwrap();
    assert_eq!(four.total, Money::from_pesos(50_000));
    let five = resolver.resolve(&taxi(), 5, 0).unwrap();
    assert_eq!(five.total, Money::from_pesos(70_000));
}

#[test]
fn occupancy_table_prices_two_guests_for_three_nights() {
    let price = PriceResolver::default().resolve(&posada(), 2, 3).unwrap();
    assert_eq!(price.unit, Money::from_pesos(180));
    assert_eq!(price.total, Money::from_pesos(540));
}
