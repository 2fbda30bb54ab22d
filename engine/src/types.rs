//! Domain types for the reservation and pricing engine.

use crate::cart::LineItem;
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Catalog item identifier (owned by the external catalog)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an `ItemId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for a cart line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(Uuid);

impl LineId {
    /// Creates a new random `LineId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `LineId` from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one selection in an itinerary day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionId(Uuid);

impl SelectionId {
    /// Creates a new random `SelectionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SelectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a confirmed reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random `ReservationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (whole pesos, no fractional unit in the catalog currency)
// ============================================================================

/// An amount of Colombian pesos
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero pesos
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from whole pesos
    #[must_use]
    pub const fn from_pesos(pesos: u64) -> Self {
        Self(pesos)
    }

    /// Returns the amount in pesos
    #[must_use]
    pub const fn pesos(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Sums an iterator of amounts, `None` on overflow
    pub fn checked_sum(amounts: impl IntoIterator<Item = Self>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Returns the amount as a float for quote arithmetic
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // quotes tolerate float rounding
    pub const fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Converts to an estimated USDT amount at `cop_per_usdt`
    ///
    /// A rate of zero yields zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_usdt(&self, cop_per_usdt: u64) -> f64 {
        if cop_per_usdt == 0 {
            return 0.0;
        }
        self.as_f64() / cop_per_usdt as f64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} COP", self.0)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog category, which decides the pricing rule of a line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Hotels and posadas, priced per night by occupancy
    Lodging,
    /// Guided tours, priced per guest
    Tour,
    /// Taxis and transfers, priced per vehicle
    Transport,
    /// Bundled packages, priced per guest
    Package,
    /// Handicrafts, priced per unit
    Craft,
}

impl Category {
    /// Lodging lines never merge and carry a separate nights count
    #[must_use]
    pub const fn is_lodging(self) -> bool {
        matches!(self, Self::Lodging)
    }

    /// Transport is priced per vehicle, not per seat
    #[must_use]
    pub const fn is_transport(self) -> bool {
        matches!(self, Self::Transport)
    }
}

/// Two-tier zone fare for transport items
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFare {
    /// Fare for a standard taxi
    pub standard: Money,
    /// Fare for a single large vehicle (van or microbus)
    pub large: Money,
}

/// A bookable unit as published by the external catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Identity
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Category
    pub category: Category,
    /// Base unit price
    pub base_price: Money,
    /// Nightly price by number of guests sharing the unit (lodging only)
    pub occupancy_prices: BTreeMap<u32, Money>,
    /// Maximum guests per unit (lodging only)
    pub max_guests: Option<u32>,
    /// Zone fare (transport only)
    pub zone_fare: Option<ZoneFare>,
    /// Inactive items cannot be added to a cart
    pub active: bool,
}

impl CatalogItem {
    /// Creates an active item with no occupancy table or zone fare
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: Category,
        base_price: Money,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            category,
            base_price,
            occupancy_prices: BTreeMap::new(),
            max_guests: None,
            zone_fare: None,
            active: true,
        }
    }

    /// Adds an occupancy-table entry
    #[must_use]
    pub fn with_occupancy_price(mut self, guests: u32, nightly: Money) -> Self {
        self.occupancy_prices.insert(guests, nightly);
        self
    }

    /// Caps guests per unit
    #[must_use]
    pub const fn with_max_guests(mut self, max_guests: u32) -> Self {
        self.max_guests = Some(max_guests);
        self
    }

    /// Attaches a zone fare
    #[must_use]
    pub const fn with_zone_fare(mut self, standard: Money, large: Money) -> Self {
        self.zone_fare = Some(ZoneFare { standard, large });
        self
    }

    /// Marks the item inactive
    #[must_use]
    pub const fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

// ============================================================================
// Party
// ============================================================================

/// Head count of a travelling party
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyComposition {
    /// Adults (at least one)
    pub adults: u32,
    /// Children (pay like adults)
    pub children: u32,
    /// Infants (never pay)
    pub infants: u32,
}

impl PartyComposition {
    /// Creates a party for a booking
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingAdult`] when `adults` is zero.
    pub const fn new(adults: u32, children: u32, infants: u32) -> Result<Self, ValidationError> {
        if adults == 0 {
            return Err(ValidationError::MissingAdult);
        }
        Ok(Self {
            adults,
            children,
            infants,
        })
    }

    /// Adults plus children
    #[must_use]
    pub const fn paying(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    /// Every body in the party, infants included
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.paying().saturating_add(self.infants)
    }
}

// ============================================================================
// Availability
// ============================================================================

/// Where a snapshot came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    /// Answered by the inventory service
    Live,
    /// Substituted after the inventory service failed (advisory only)
    Fallback,
}

/// Capacity of one (item, date) pair at the time it was fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    /// Total slots
    pub capacity: u32,
    /// Slots already committed by any session
    pub committed: u32,
    /// Date closed for sale
    pub blocked: bool,
    /// Origin of the numbers
    pub source: SnapshotSource,
}

impl AvailabilitySnapshot {
    /// A snapshot reported by the inventory service
    #[must_use]
    pub const fn live(capacity: u32, committed: u32, blocked: bool) -> Self {
        Self {
            capacity,
            committed,
            blocked,
            source: SnapshotSource::Live,
        }
    }

    /// The conservative stand-in used when the inventory service is down
    #[must_use]
    pub const fn fallback(capacity: u32) -> Self {
        Self {
            capacity,
            committed: 0,
            blocked: false,
            source: SnapshotSource::Fallback,
        }
    }

    /// Slots still free
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.committed)
    }

    /// Whether `quantity` more slots fit
    #[must_use]
    pub const fn admits(&self, quantity: u32) -> bool {
        !self.blocked && quantity <= self.remaining()
    }

    /// Whether this snapshot may back a commit decision
    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        matches!(self.source, SnapshotSource::Live)
    }
}

/// One line of an inventory commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLine {
    /// Item
    pub item_id: ItemId,
    /// Date the slots are consumed on
    pub date: NaiveDate,
    /// Slots consumed
    pub quantity: u32,
}

// ============================================================================
// Traveler
// ============================================================================

/// Lead traveler details collected before payment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerInfo {
    /// Full name as on the document
    pub full_name: String,
    /// Email
    pub email: String,
    /// WhatsApp phone
    pub phone: String,
    /// Passport or national id
    pub document_id: String,
    /// Country of origin
    pub country: String,
    /// Billing address
    pub billing_address: String,
    /// Where the traveler stays on the island
    pub accommodation: String,
    /// Emergency contact name and phone
    pub emergency_contact: String,
}

impl TravelerInfo {
    /// Names of required fields that are blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("document_id", &self.document_id),
            ("country", &self.country),
            ("billing_address", &self.billing_address),
            ("accommodation", &self.accommodation),
            ("emergency_contact", &self.emergency_contact),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

// ============================================================================
// Payment and audit
// ============================================================================

/// Supported payment rails
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cards and PSE through PayU Latam, settled in COP
    PayU,
    /// Binance Pay, settled in USDT
    Binance,
    /// Hedera network, settled in USDT
    Hedera,
}

impl PaymentMethod {
    /// Upper-case code used in transaction references
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PayU => "PAYU",
            Self::Binance => "BINANCE",
            Self::Hedera => "HEDERA",
        }
    }

    /// Crypto rails quote a USDT amount
    #[must_use]
    pub const fn is_crypto(self) -> bool {
        !matches!(self, Self::PayU)
    }
}

/// Transaction reference submitted for notarization
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRef(String);

impl TransactionRef {
    /// `TX-<METHOD>-<epoch millis>`
    #[must_use]
    pub fn generate(method: PaymentMethod, at: DateTime<Utc>) -> Self {
        Self(format!("TX-{}-{}", method.code(), at.timestamp_millis()))
    }

    /// Returns the raw reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger verification status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// Not yet confirmed on the ledger
    Pending,
    /// Confirmed on the ledger
    Verified,
    /// The ledger rejected the transaction
    Failed,
}

/// What the ledger returned for a notarization request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notarization {
    /// Ledger-side reference
    pub external_ref: String,
    /// Status at response time
    pub status: AuditStatus,
}

/// Audit trail attached to a reservation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Reference the engine asked the ledger to notarize
    pub transaction_ref: TransactionRef,
    /// Ledger-side reference, absent while the ledger was unreachable
    pub external_ref: Option<String>,
    /// Verification status
    pub status: AuditStatus,
}

impl AuditRecord {
    /// Record for a transaction the ledger has not acknowledged yet
    #[must_use]
    pub const fn pending(transaction_ref: TransactionRef) -> Self {
        Self {
            transaction_ref,
            external_ref: None,
            status: AuditStatus::Pending,
        }
    }

    /// Record built from a ledger response
    #[must_use]
    pub fn notarized(transaction_ref: TransactionRef, notarization: Notarization) -> Self {
        Self {
            transaction_ref,
            external_ref: Some(notarization.external_ref),
            status: notarization.status,
        }
    }
}

// ============================================================================
// Reservation
// ============================================================================

/// Terminal artifact of a successful checkout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Identity
    pub id: ReservationId,
    /// Committed lines, as priced at add time
    pub lines: Vec<LineItem>,
    /// Amount charged
    pub total: Money,
    /// Rail used
    pub payment_method: PaymentMethod,
    /// Settlement reference from the payment gateway
    pub settlement_ref: String,
    /// Lead traveler
    pub traveler: TravelerInfo,
    /// Notarization trail
    pub audit: AuditRecord,
    /// When the reservation was created
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_overflow_is_detected() {
        assert_eq!(Money::from_pesos(u64::MAX).checked_multiply(2), None);
        assert_eq!(
            Money::checked_sum([Money::from_pesos(1), Money::from_pesos(u64::MAX)]),
            None
        );
        assert_eq!(
            Money::checked_sum([Money::from_pesos(150), Money::from_pesos(180)]),
            Some(Money::from_pesos(330))
        );
    }

    #[test]
    fn usdt_estimate_uses_the_rate() {
        let amount = Money::from_pesos(200_000);
        assert!((amount.to_usdt(4000) - 50.0).abs() < f64::EPSILON);
        assert!(amount.to_usdt(0).abs() < f64::EPSILON);
    }

    #[test]
    fn party_requires_an_adult() {
        assert_eq!(
            PartyComposition::new(0, 2, 0),
            Err(ValidationError::MissingAdult)
        );
        let party = PartyComposition::new(2, 1, 1).unwrap();
        assert_eq!(party.paying(), 3);
        assert_eq!(party.total(), 4);
    }

    #[test]
    fn snapshot_admission() {
        let open = AvailabilitySnapshot::live(10, 7, false);
        assert_eq!(open.remaining(), 3);
        assert!(open.admits(3));
        assert!(!open.admits(4));

        let blocked = AvailabilitySnapshot::live(10, 0, true);
        assert!(!blocked.admits(1));

        let oversold = AvailabilitySnapshot::live(5, 9, false);
        assert_eq!(oversold.remaining(), 0);

        assert!(!AvailabilitySnapshot::fallback(10).is_authoritative());
    }

    #[test]
    fn traveler_missing_fields_ignores_whitespace() {
        let traveler = TravelerInfo {
            full_name: "Ana Gómez".into(),
            email: "ana@example.com".into(),
            phone: "  ".into(),
            ..TravelerInfo::default()
        };
        let missing = traveler.missing_fields();
        assert!(missing.contains(&"phone".to_string()));
        assert!(!missing.contains(&"email".to_string()));
        assert_eq!(missing.len(), 6);
    }

    #[test]
    fn transaction_ref_format() {
        let at = DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap();
        let tx = TransactionRef::generate(PaymentMethod::Binance, at);
        assert_eq!(tx.as_str(), "TX-BINANCE-1735689600000");
    }
}
