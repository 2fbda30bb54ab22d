//! In-memory collaborators for development, tests and the demo.
//!
//! Each mock records what it was asked and can be told to fail or to never
//! answer, so checkout failure and timeout paths can be driven
//! deterministically.

use crate::collaborators::{
    CatalogService, CollaboratorResult, InventoryService, LedgerService, PaymentGateway,
    SettlementReceipt, SettlementRequest,
};
use crate::error::CollaboratorError;
use crate::types::{
    AuditStatus, AvailabilitySnapshot, CatalogItem, CommitLine, ItemId, Notarization,
    TransactionRef,
};
use chrono::NaiveDate;
use futures::future::{self, BoxFuture};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    capacity: u32,
    committed: u32,
    blocked: bool,
}

/// In-memory capacity pool
///
/// Pairs never configured report `default_capacity` free slots.
#[derive(Debug)]
pub struct InMemoryInventory {
    slots: Mutex<HashMap<(ItemId, NaiveDate), Slot>>,
    default_capacity: u32,
    fail_reads: AtomicBool,
    fail_commits: AtomicBool,
    hang_commits: AtomicBool,
    reads: AtomicUsize,
    commits: Mutex<Vec<Vec<CommitLine>>>,
}

impl InMemoryInventory {
    /// Empty pool where unknown pairs have no capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_capacity(0)
    }

    /// Empty pool where unknown pairs have `capacity` slots
    #[must_use]
    pub fn with_default_capacity(capacity: u32) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            default_capacity: capacity,
            fail_reads: AtomicBool::new(false),
            fail_commits: AtomicBool::new(false),
            hang_commits: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            commits: Mutex::new(Vec::new()),
        }
    }

    fn slot(&self, slots: &HashMap<(ItemId, NaiveDate), Slot>, key: &(ItemId, NaiveDate)) -> Slot {
        slots.get(key).copied().unwrap_or(Slot {
            capacity: self.default_capacity,
            ..Slot::default()
        })
    }

    /// Set the capacity of (item, date)
    pub fn set_capacity(&self, item_id: &ItemId, date: NaiveDate, capacity: u32) {
        let key = (item_id.clone(), date);
        let mut slots = lock(&self.slots);
        let slot = self.slot(&slots, &key);
        slots.insert(key, Slot { capacity, ..slot });
    }

    /// Close (item, date) for sale
    pub fn block(&self, item_id: &ItemId, date: NaiveDate) {
        let key = (item_id.clone(), date);
        let mut slots = lock(&self.slots);
        let slot = self.slot(&slots, &key);
        slots.insert(key, Slot { blocked: true, ..slot });
    }

    /// Make availability reads fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make commits fail as unavailable
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Make commits never complete, leaving the caller's timeout to fire
    pub fn hang_commits(&self, hang: bool) {
        self.hang_commits.store(hang, Ordering::SeqCst);
    }

    /// Slots committed for (item, date)
    #[must_use]
    pub fn committed(&self, item_id: &ItemId, date: NaiveDate) -> u32 {
        let key = (item_id.clone(), date);
        let slots = lock(&self.slots);
        self.slot(&slots, &key).committed
    }

    /// Availability reads served
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful commits, in order
    #[must_use]
    pub fn commits(&self) -> Vec<Vec<CommitLine>> {
        lock(&self.commits).clone()
    }
}

impl Default for InMemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryService for InMemoryInventory {
    fn get_availability<'a>(
        &'a self,
        item_id: &'a ItemId,
        date: NaiveDate,
    ) -> BoxFuture<'a, CollaboratorResult<AvailabilitySnapshot>> {
        Box::pin(async move {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(CollaboratorError::Unavailable("inventory offline".into()));
            }
            let slots = lock(&self.slots);
            let slot = self.slot(&slots, &(item_id.clone(), date));
            Ok(AvailabilitySnapshot::live(slot.capacity, slot.committed, slot.blocked))
        })
    }

    fn commit_reservation(&self, lines: Vec<CommitLine>) -> BoxFuture<'_, CollaboratorResult<()>> {
        Box::pin(async move {
            if self.hang_commits.load(Ordering::SeqCst) {
                future::pending::<()>().await;
            }
            if self.fail_commits.load(Ordering::SeqCst) {
                return Err(CollaboratorError::Unavailable("inventory offline".into()));
            }
            let mut slots = lock(&self.slots);

            for line in &lines {
                let slot = self.slot(&slots, &(line.item_id.clone(), line.date));
                let fits = slot
                    .committed
                    .checked_add(line.quantity)
                    .is_some_and(|total| total <= slot.capacity);
                if slot.blocked || !fits {
                    return Err(CollaboratorError::CapacityExhausted {
                        item_id: line.item_id.clone(),
                        date: line.date,
                    });
                }
            }
            for line in &lines {
                let key = (line.item_id.clone(), line.date);
                let slot = self.slot(&slots, &key);
                slots.insert(
                    key,
                    Slot {
                        committed: slot.committed.saturating_add(line.quantity),
                        ..slot
                    },
                );
            }
            drop(slots);

            lock(&self.commits).push(lines);
            Ok(())
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// In-memory catalog
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: Mutex<BTreeMap<ItemId, CatalogItem>>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding `items`
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// Publish or replace an item
    pub fn insert(&self, item: CatalogItem) {
        lock(&self.items).insert(item.id.clone(), item);
    }

    /// Make every call fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> CollaboratorResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CollaboratorError::Unavailable("catalog offline".into()))
        } else {
            Ok(())
        }
    }
}

impl CatalogService for InMemoryCatalog {
    fn list_items(&self) -> BoxFuture<'_, CollaboratorResult<Vec<CatalogItem>>> {
        Box::pin(async move {
            self.check()?;
            Ok(lock(&self.items).values().cloned().collect())
        })
    }

    fn get_item<'a>(
        &'a self,
        item_id: &'a ItemId,
    ) -> BoxFuture<'a, CollaboratorResult<Option<CatalogItem>>> {
        Box::pin(async move {
            self.check()?;
            Ok(lock(&self.items).get(item_id).cloned())
        })
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// How [`MockLedger`] answers notarization requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Confirm immediately
    Verified,
    /// Accept but leave pending
    Pending,
    /// Fail every call
    Unavailable,
    /// Never answer
    Hanging,
}

/// In-memory notarization ledger
#[derive(Debug)]
pub struct MockLedger {
    mode: Mutex<LedgerMode>,
    sequence: AtomicU64,
    records: Mutex<HashMap<String, AuditStatus>>,
    notarized: Mutex<Vec<TransactionRef>>,
}

impl MockLedger {
    /// Ledger that verifies immediately
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(LedgerMode::Verified)
    }

    /// Ledger in `mode`
    #[must_use]
    pub fn with_mode(mode: LedgerMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            sequence: AtomicU64::new(0),
            records: Mutex::new(HashMap::new()),
            notarized: Mutex::new(Vec::new()),
        }
    }

    /// Switch mode
    pub fn set_mode(&self, mode: LedgerMode) {
        *lock(&self.mode) = mode;
    }

    /// Override the status of a recorded reference
    pub fn set_status(&self, external_ref: &str, status: AuditStatus) {
        lock(&self.records).insert(external_ref.to_string(), status);
    }

    /// Transaction references successfully notarized
    #[must_use]
    pub fn notarized(&self) -> Vec<TransactionRef> {
        lock(&self.notarized).clone()
    }

    fn mode(&self) -> LedgerMode {
        *lock(&self.mode)
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerService for MockLedger {
    fn notarize<'a>(
        &'a self,
        transaction_ref: &'a TransactionRef,
    ) -> BoxFuture<'a, CollaboratorResult<Notarization>> {
        Box::pin(async move {
            let status = match self.mode() {
                LedgerMode::Unavailable => {
                    return Err(CollaboratorError::Unavailable("ledger unreachable".into()));
                },
                LedgerMode::Hanging => return future::pending().await,
                LedgerMode::Verified => AuditStatus::Verified,
                LedgerMode::Pending => AuditStatus::Pending,
            };
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let external_ref = format!("0.0.{}@{}", 100_000 + sequence, transaction_ref);

            lock(&self.records).insert(external_ref.clone(), status);
            lock(&self.notarized).push(transaction_ref.clone());
            Ok(Notarization {
                external_ref,
                status,
            })
        })
    }

    fn status<'a>(&'a self, external_ref: &'a str) -> BoxFuture<'a, CollaboratorResult<AuditStatus>> {
        Box::pin(async move {
            match self.mode() {
                LedgerMode::Unavailable => {
                    return Err(CollaboratorError::Unavailable("ledger unreachable".into()));
                },
                LedgerMode::Hanging => return future::pending().await,
                LedgerMode::Verified | LedgerMode::Pending => {},
            }
            lock(&self.records)
                .get(external_ref)
                .copied()
                .ok_or_else(|| CollaboratorError::Rejected(format!("unknown reference {external_ref}")))
        })
    }
}

// ============================================================================
// Payments
// ============================================================================

/// In-memory payment rail
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
    decline: AtomicBool,
    fail_refunds: AtomicBool,
    sequence: AtomicU64,
    settlements: Mutex<Vec<SettlementRequest>>,
    refunds: Mutex<Vec<SettlementReceipt>>,
}

impl MockPaymentGateway {
    /// Gateway that accepts every payment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decline settlements
    pub fn decline(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }

    /// Make refunds fail
    pub fn fail_refunds(&self, fail: bool) {
        self.fail_refunds.store(fail, Ordering::SeqCst);
    }

    /// Settlement requests accepted, in order
    #[must_use]
    pub fn settlements(&self) -> Vec<SettlementRequest> {
        lock(&self.settlements).clone()
    }

    /// Receipts refunded, in order
    #[must_use]
    pub fn refunds(&self) -> Vec<SettlementReceipt> {
        lock(&self.refunds).clone()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn settle(&self, request: SettlementRequest) -> BoxFuture<'_, CollaboratorResult<SettlementReceipt>> {
        Box::pin(async move {
            if self.decline.load(Ordering::SeqCst) {
                return Err(CollaboratorError::Rejected("payment declined".into()));
            }
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let receipt = SettlementReceipt {
                settlement_ref: format!("{}-{sequence:06}", request.method.code()),
                transaction_ref: request.transaction_ref.clone(),
                amount: request.amount,
                method: request.method,
            };
            lock(&self.settlements).push(request);
            Ok(receipt)
        })
    }

    fn refund<'a>(&'a self, receipt: &'a SettlementReceipt) -> BoxFuture<'a, CollaboratorResult<()>> {
        Box::pin(async move {
            if self.fail_refunds.load(Ordering::SeqCst) {
                return Err(CollaboratorError::Unavailable("refund rail offline".into()));
            }
            lock(&self.refunds).push(receipt.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Category, Money, PaymentMethod};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 5).unwrap()
    }

    #[test]
    fn commit_is_all_or_nothing() {
        let inventory = InMemoryInventory::new();
        let tour = ItemId::new("tour");
        let kayak = ItemId::new("kayak");
        inventory.set_capacity(&tour, date(), 10);
        inventory.set_capacity(&kayak, date(), 1);

        let lines = vec![
            CommitLine {
                item_id: tour.clone(),
                date: date(),
                quantity: 4,
            },
            CommitLine {
                item_id: kayak.clone(),
                date: date(),
                quantity: 2,
            },
        ];
        let result = tokio_test::block_on(inventory.commit_reservation(lines));
        assert_eq!(
            result,
            Err(CollaboratorError::CapacityExhausted {
                item_id: kayak,
                date: date()
            })
        );
        assert_eq!(inventory.committed(&tour, date()), 0);
        assert!(inventory.commits().is_empty());
    }

    #[test]
    fn blocking_keeps_configured_capacity() {
        let inventory = InMemoryInventory::with_default_capacity(8);
        let tour = ItemId::new("tour");
        inventory.block(&tour, date());
        let snapshot = tokio_test::block_on(inventory.get_availability(&tour, date())).unwrap();
        assert_eq!(snapshot, AvailabilitySnapshot::live(8, 0, true));
        assert_eq!(inventory.reads(), 1);
    }

    #[test]
    fn catalog_lookup() {
        let catalog = InMemoryCatalog::with_items([CatalogItem::new(
            "acuario",
            "Acuario",
            Category::Tour,
            Money::from_pesos(85_000),
        )]);
        let found = tokio_test::block_on(catalog.get_item(&ItemId::new("acuario"))).unwrap();
        assert!(found.is_some());
        assert_eq!(tokio_test::block_on(catalog.list_items()).unwrap().len(), 1);

        catalog.set_unavailable(true);
        assert!(tokio_test::block_on(catalog.list_items()).is_err());
    }

    #[test]
    fn gateway_records_settlements() {
        let gateway = MockPaymentGateway::new();
        let request = SettlementRequest {
            transaction_ref: TransactionRef::generate(PaymentMethod::PayU, chrono::Utc::now()),
            amount: Money::from_pesos(100),
            usdt_amount: None,
            method: PaymentMethod::PayU,
        };
        let receipt = tokio_test::block_on(gateway.settle(request)).unwrap();
        assert_eq!(receipt.settlement_ref, "PAYU-000001");
        assert_eq!(gateway.settlements().len(), 1);

        gateway.decline(true);
        let declined = SettlementRequest {
            transaction_ref: receipt.transaction_ref.clone(),
            amount: Money::from_pesos(100),
            usdt_amount: None,
            method: PaymentMethod::PayU,
        };
        assert!(tokio_test::block_on(gateway.settle(declined)).is_err());
    }
}
