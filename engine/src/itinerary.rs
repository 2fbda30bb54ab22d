//! Multi-day itinerary plans and their quotes.

use crate::allocation::AllocationCalculator;
use crate::config::{EngineConfig, Margin};
use crate::error::ValidationError;
use crate::types::{CatalogItem, Money, PartyComposition, SelectionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One catalog item chosen for a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Selection identity (the same item may be chosen twice)
    pub id: SelectionId,
    /// Item as it was in the catalog when chosen
    pub item: CatalogItem,
}

/// One day of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// Date
    pub date: NaiveDate,
    /// Items chosen for the day, in order
    pub selections: Vec<Selection>,
}

/// A plan covering consecutive days from `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryPlan {
    days: Vec<ItineraryDay>,
}

impl ItineraryPlan {
    /// Empty plan from `start` to `end` inclusive, truncated to `max_days`
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDateRange`] if `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        let days = start
            .iter_days()
            .take_while(|date| *date <= end)
            .take(usize::try_from(max_days).unwrap_or(usize::MAX))
            .map(|date| ItineraryDay {
                date,
                selections: Vec::new(),
            })
            .collect();
        Ok(Self { days })
    }

    /// Fresh plan over a new range, keeping selections whose date is still covered
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDateRange`] if `end` precedes `start`.
    pub fn rebuild(&self, start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<Self, ValidationError> {
        let mut plan = Self::new(start, end, max_days)?;
        for day in &mut plan.days {
            if let Some(previous) = self.day(day.date) {
                day.selections.clone_from(&previous.selections);
            }
        }
        Ok(plan)
    }

    /// Days in order
    #[must_use]
    pub fn days(&self) -> &[ItineraryDay] {
        &self.days
    }

    /// Day for `date`
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&ItineraryDay> {
        self.days.iter().find(|day| day.date == date)
    }

    /// First day
    #[must_use]
    pub fn start(&self) -> Option<NaiveDate> {
        self.days.first().map(|day| day.date)
    }

    /// Last day
    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        self.days.last().map(|day| day.date)
    }

    /// Choose `item` on `date`
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DateOutsidePlan`] if the plan does not cover
    /// `date`, or [`ValidationError::InactiveItem`] for a withdrawn item.
    pub fn add_item(&mut self, date: NaiveDate, item: CatalogItem) -> Result<SelectionId, ValidationError> {
        if !item.active {
            return Err(ValidationError::InactiveItem(item.id));
        }
        let day = self
            .days
            .iter_mut()
            .find(|day| day.date == date)
            .ok_or(ValidationError::DateOutsidePlan(date))?;
        let id = SelectionId::new();
        day.selections.push(Selection { id, item });
        Ok(id)
    }

    /// Drop a selection from whichever day holds it
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownSelection`] if no day holds `id`.
    pub fn remove_item(&mut self, id: SelectionId) -> Result<Selection, ValidationError> {
        for day in &mut self.days {
            if let Some(index) = day.selections.iter().position(|s| s.id == id) {
                return Ok(day.selections.remove(index));
            }
        }
        Err(ValidationError::UnknownSelection(id))
    }
}

/// Cost of one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayQuote {
    /// Date
    pub date: NaiveDate,
    /// Net cost of the day's selections
    pub net: Money,
}

/// Quote for a whole plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryQuote {
    /// Net cost
    pub net_total: f64,
    /// Sale price (net plus margin)
    pub pvp_total: f64,
    /// Sale price minus net cost
    pub margin_value: f64,
    /// Rooms for the party
    pub rooms_needed: u32,
    /// Taxis for the party
    pub taxis_needed: u32,
    /// Per-day net costs
    pub days: Vec<DayQuote>,
}

/// Sums day costs for a party and applies the agency margin
#[derive(Debug, Clone)]
pub struct ItineraryAggregator {
    allocation: AllocationCalculator,
    margin: Margin,
}

impl ItineraryAggregator {
    /// Creates an aggregator
    #[must_use]
    pub const fn new(allocation: AllocationCalculator, margin: Margin) -> Self {
        Self { allocation, margin }
    }

    /// Aggregator using the configured allocation sizes and margin
    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            AllocationCalculator::from_config(&config.pricing),
            config.pricing.margin,
        )
    }

    /// Quote `plan` for `party` at the configured margin
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PriceOverflow`] if costs overflow.
    pub fn quote(&self, plan: &ItineraryPlan, party: &PartyComposition) -> Result<ItineraryQuote, ValidationError> {
        self.quote_with_margin(plan, party, self.margin)
    }

    /// Quote `plan` for `party` at an explicit margin
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PriceOverflow`] if costs overflow.
    pub fn quote_with_margin(
        &self,
        plan: &ItineraryPlan,
        party: &PartyComposition,
        margin: Margin,
    ) -> Result<ItineraryQuote, ValidationError> {
        let allocation = self.allocation.allocate(party);

        let days = plan
            .days()
            .iter()
            .map(|day| {
                let costs = day
                    .selections
                    .iter()
                    .map(|selection| self.line_cost(&selection.item, party));
                let net = costs
                    .collect::<Option<Vec<_>>>()
                    .and_then(Money::checked_sum)
                    .ok_or(ValidationError::PriceOverflow)?;
                Ok(DayQuote {
                    date: day.date,
                    net,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let net = Money::checked_sum(days.iter().map(|day| day.net))
            .ok_or(ValidationError::PriceOverflow)?;
        let net_total = net.as_f64();
        let pvp_total = margin.apply(net_total);

        Ok(ItineraryQuote {
            net_total,
            pvp_total,
            margin_value: pvp_total - net_total,
            rooms_needed: allocation.rooms,
            taxis_needed: allocation.vehicles,
            days,
        })
    }

    /// Transport per vehicle for every body; everything else per paying guest
    fn line_cost(&self, item: &CatalogItem, party: &PartyComposition) -> Option<Money> {
        let units = if item.category.is_transport() {
            self.allocation.vehicles_needed(party.total())
        } else {
            party.paying()
        };
        item.base_price.checked_multiply(units)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn aggregator() -> ItineraryAggregator {
        ItineraryAggregator::from_config(&EngineConfig::default())
    }

    #[test]
    fn plan_covers_the_inclusive_range_up_to_the_cap() {
        let plan = ItineraryPlan::new(day(1), day(3), 15).unwrap();
        assert_eq!(plan.days().len(), 3);

        let capped = ItineraryPlan::new(day(1), day(30), 15).unwrap();
        assert_eq!(capped.days().len(), 15);
        assert_eq!(capped.end(), Some(day(15)));

        assert_eq!(
            ItineraryPlan::new(day(3), day(1), 15),
            Err(ValidationError::InvalidDateRange {
                start: day(3),
                end: day(1)
            })
        );
    }

    #[test]
    fn selections_must_fall_inside_the_plan() {
        let mut plan = ItineraryPlan::new(day(1), day(2), 15).unwrap();
        let tour = CatalogItem::new("acuario", "Acuario", Category::Tour, Money::from_pesos(10));
        assert_eq!(
            plan.add_item(day(5), tour.clone()),
            Err(ValidationError::DateOutsidePlan(day(5)))
        );
        let id = plan.add_item(day(2), tour).unwrap();
        assert_eq!(plan.remove_item(id).unwrap().id, id);
        assert_eq!(plan.remove_item(id), Err(ValidationError::UnknownSelection(id)));
    }

    #[test]
    fn rebuild_keeps_selections_still_in_range() {
        let mut plan = ItineraryPlan::new(day(1), day(4), 15).unwrap();
        let tour = CatalogItem::new("acuario", "Acuario", Category::Tour, Money::from_pesos(10));
        plan.add_item(day(1), tour.clone()).unwrap();
        plan.add_item(day(3), tour).unwrap();

        let rebuilt = plan.rebuild(day(2), day(6), 15).unwrap();
        assert_eq!(rebuilt.start(), Some(day(2)));
        assert_eq!(rebuilt.days().len(), 5);
        assert_eq!(rebuilt.day(day(3)).unwrap().selections.len(), 1);
        assert!(rebuilt.day(day(1)).is_none());
        let total: usize = rebuilt.days().iter().map(|d| d.selections.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn transport_counts_bodies_and_tours_count_payers() {
        let mut plan = ItineraryPlan::new(day(1), day(2), 15).unwrap();
        plan.add_item(
            day(1),
            CatalogItem::new("taxi", "Taxi", Category::Transport, Money::from_pesos(50_000)),
        )
        .unwrap();
        plan.add_item(
            day(2),
            CatalogItem::new("tour", "Tour", Category::Tour, Money::from_pesos(100_000)),
        )
        .unwrap();
        let party = PartyComposition::new(3, 1, 1).unwrap();

        let quote = aggregator().quote(&plan, &party).unwrap();
        assert_eq!(quote.days[0].net, Money::from_pesos(100_000));
        assert_eq!(quote.days[1].net, Money::from_pesos(400_000));
        assert!((quote.net_total - 500_000.0).abs() < 1e-6);
        assert!((quote.pvp_total - 600_000.0).abs() < 1e-6);
        assert!((quote.margin_value - 100_000.0).abs() < 1e-6);
        assert_eq!(quote.rooms_needed, 2);
        assert_eq!(quote.taxis_needed, 2);
    }

    #[test]
    fn explicit_margin_overrides_configured_one() {
        let mut plan = ItineraryPlan::new(day(1), day(1), 15).unwrap();
        plan.add_item(
            day(1),
            CatalogItem::new("tour", "Tour", Category::Tour, Money::from_pesos(1000)),
        )
        .unwrap();
        let party = PartyComposition::new(1, 0, 0).unwrap();
        let quote = aggregator()
            .quote_with_margin(&plan, &party, Margin::new(0.5).unwrap())
            .unwrap();
        assert!((quote.pvp_total - 1500.0).abs() < 1e-6);
    }
}
