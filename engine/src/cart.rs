//! Shopping cart.
//!
//! An ordered list of priced lines. Prices are frozen when a line is added
//! and never recomputed, neither on read nor when a later add merges in.

use crate::capacity::Demand;
use crate::error::ValidationError;
use crate::pricing::{LinePrice, PriceResolver};
use crate::types::{CatalogItem, Category, CommitLine, ItemId, LineId, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cart entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line identity
    pub line_id: LineId,
    /// Catalog item
    pub item_id: ItemId,
    /// Title at add time
    pub title: String,
    /// Category at add time
    pub category: Category,
    /// Visit date, or check-in date for lodging
    pub date: NaiveDate,
    /// Optional time slot
    pub time: Option<String>,
    /// Guests for tours and transport, units for crafts, always 1 for lodging
    pub quantity: u32,
    /// Guests covered by the line
    pub pax: u32,
    /// Nights (lodging only)
    pub nights: Option<u32>,
    /// Resolved unit price
    pub unit_price: Money,
    /// Resolved line total
    pub total_price: Money,
}

impl LineItem {
    fn same_slot(&self, item_id: &ItemId, date: NaiveDate, time: Option<&str>) -> bool {
        !self.category.is_lodging()
            && &self.item_id == item_id
            && self.date == date
            && self.time.as_deref() == time
    }

    fn is_priced_per_unit(&self) -> bool {
        self.unit_price.checked_multiply(self.quantity) == Some(self.total_price)
    }
}

/// Parameters of an add
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    /// Guests or units; guests per room for lodging
    pub quantity: u32,
    /// Visit or check-in date
    pub date: NaiveDate,
    /// Optional time slot
    pub time: Option<String>,
    /// Nights (lodging only)
    pub nights: Option<u32>,
    /// Composite unit price computed by the caller
    pub price_override: Option<Money>,
}

impl AddLine {
    /// `quantity` guests or units on `date`
    #[must_use]
    pub const fn new(quantity: u32, date: NaiveDate) -> Self {
        Self {
            quantity,
            date,
            time: None,
            nights: None,
            price_override: None,
        }
    }

    /// Sets the time slot
    #[must_use]
    pub fn at(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Sets the nights of a lodging line
    #[must_use]
    pub const fn for_nights(mut self, nights: u32) -> Self {
        self.nights = Some(nights);
        self
    }

    /// Sets a caller-computed unit price
    #[must_use]
    pub const fn with_price_override(mut self, unit: Money) -> Self {
        self.price_override = Some(unit);
        self
    }

    /// Slots this add consumes from the capacity pool
    #[must_use]
    pub const fn slots(&self, category: Category) -> u32 {
        if category.is_lodging() { 1 } else { self.quantity }
    }
}

/// Ordered collection of line items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Line by id
    #[must_use]
    pub fn line(&self, line_id: LineId) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    /// No lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Check an add without touching the cart
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an inactive item, a zero quantity, a
    /// lodging line without nights, or more guests than the room takes.
    pub fn validate_add(item: &CatalogItem, request: &AddLine) -> Result<(), ValidationError> {
        if !item.active {
            return Err(ValidationError::InactiveItem(item.id.clone()));
        }
        if request.quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity);
        }
        if item.category.is_lodging() {
            if request.nights.unwrap_or(0) == 0 {
                return Err(ValidationError::NonPositiveNights);
            }
            match item.max_guests {
                Some(max_guests) if request.quantity > max_guests => {
                    return Err(ValidationError::GuestsExceedRoom {
                        guests: request.quantity,
                        max_guests,
                    });
                },
                _ => {},
            }
        }
        Ok(())
    }

    /// Add or merge a line, returning the id of the affected line
    ///
    /// A non-lodging add merges into the line with the same (item, date, time)
    /// only when both are priced per unit at the same unit price; the existing
    /// price stays frozen and quantities are summed. Any other add (a different
    /// override, a changed catalog price, a per-vehicle fare) appends a new
    /// line. `line_id` is used only when a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the add is invalid or the price
    /// overflows. The cart is unchanged on error.
    pub fn add(
        &mut self,
        line_id: LineId,
        item: &CatalogItem,
        request: &AddLine,
        resolver: &PriceResolver,
    ) -> Result<LineId, ValidationError> {
        Self::validate_add(item, request)?;

        let price = Self::price(
            item,
            request.quantity,
            request.nights,
            request.price_override,
            resolver,
        )?;
        let per_unit = price.unit.checked_multiply(request.quantity) == Some(price.total);

        let slot = self.lines.iter().position(|line| {
            per_unit
                && line.unit_price == price.unit
                && line.is_priced_per_unit()
                && line.same_slot(&item.id, request.date, request.time.as_deref())
        });

        let (index, updated) = match slot {
            Some(index) => {
                let existing = &self.lines[index];
                let quantity = existing
                    .quantity
                    .checked_add(request.quantity)
                    .ok_or(ValidationError::PriceOverflow)?;
                let total_price = existing
                    .unit_price
                    .checked_multiply(quantity)
                    .ok_or(ValidationError::PriceOverflow)?;
                let merged = LineItem {
                    quantity,
                    pax: quantity,
                    total_price,
                    ..existing.clone()
                };
                (Some(index), merged)
            },
            None => {
                let lodging = item.category.is_lodging();
                let line = LineItem {
                    line_id,
                    item_id: item.id.clone(),
                    title: item.title.clone(),
                    category: item.category,
                    date: request.date,
                    time: request.time.clone(),
                    quantity: if lodging { 1 } else { request.quantity },
                    pax: request.quantity,
                    nights: if lodging { request.nights } else { None },
                    unit_price: price.unit,
                    total_price: price.total,
                };
                (None, line)
            },
        };

        let others = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != index)
            .map(|(_, line)| line.total_price);
        Money::checked_sum(others.chain(std::iter::once(updated.total_price)))
            .ok_or(ValidationError::PriceOverflow)?;

        let id = updated.line_id;
        match index {
            Some(index) => self.lines[index] = updated,
            None => self.lines.push(updated),
        }
        Ok(id)
    }

    fn price(
        item: &CatalogItem,
        quantity: u32,
        nights: Option<u32>,
        price_override: Option<Money>,
        resolver: &PriceResolver,
    ) -> Result<LinePrice, ValidationError> {
        match price_override {
            Some(unit) => {
                let units = if item.category.is_lodging() { 1 } else { quantity };
                Ok(LinePrice {
                    unit,
                    total: unit
                        .checked_multiply(units)
                        .ok_or(ValidationError::PriceOverflow)?,
                })
            },
            None => resolver.resolve(item, quantity, nights.unwrap_or(0)),
        }
    }

    /// Remove a line
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownLine`] if no line has `line_id`.
    pub fn remove(&mut self, line_id: LineId) -> Result<LineItem, ValidationError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.line_id == line_id)
            .ok_or(ValidationError::UnknownLine(line_id))?;
        Ok(self.lines.remove(index))
    }

    /// Remove every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line totals
    #[must_use]
    pub fn total_price(&self) -> Money {
        // Adds keep the sum in range.
        Money::checked_sum(self.lines.iter().map(|line| line.total_price)).unwrap_or_default()
    }

    /// Sum of quantities
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Slots already held for (item, date) across all lines
    #[must_use]
    pub fn demand_for(&self, item_id: &ItemId, date: NaiveDate) -> u32 {
        self.lines
            .iter()
            .filter(|line| &line.item_id == item_id && line.date == date)
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Demand per (item, date), in order of first appearance
    #[must_use]
    pub fn demand(&self) -> Vec<Demand> {
        let mut demand: Vec<Demand> = Vec::new();
        for line in &self.lines {
            match demand
                .iter_mut()
                .find(|d| d.item_id == line.item_id && d.date == line.date)
            {
                Some(entry) => entry.quantity = entry.quantity.saturating_add(line.quantity),
                None => demand.push(Demand {
                    item_id: line.item_id.clone(),
                    date: line.date,
                    quantity: line.quantity,
                }),
            }
        }
        demand
    }

    /// Lines submitted to the inventory commit
    #[must_use]
    pub fn commit_lines(&self) -> Vec<CommitLine> {
        self.demand()
            .into_iter()
            .map(|d| CommitLine {
                item_id: d.item_id,
                date: d.date,
                quantity: d.quantity,
            })
            .collect()
    }
}

/// Cart totals as exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line totals
    pub total_price: Money,
    /// Sum of quantities
    pub item_count: u32,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        Self {
            total_price: cart.total_price(),
            item_count: cart.item_count(),
        }
    }
}
