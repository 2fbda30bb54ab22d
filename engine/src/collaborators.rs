//! External collaborator interfaces.
//!
//! The engine owns none of these systems. Inventory, the ledger, the catalog
//! and the payment rails are reached only through the traits below, held as
//! `Arc<dyn _>` in the checkout environment so production services and the
//! in-memory [`mocks`](crate::mocks) are interchangeable.

use crate::error::CollaboratorError;
use crate::types::{
    AuditStatus, AvailabilitySnapshot, CatalogItem, CommitLine, ItemId, Money, Notarization,
    PaymentMethod, TransactionRef,
};
use chrono::NaiveDate;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Result type returned by every collaborator call
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Inventory / availability service owning the capacity pool
pub trait InventoryService: Send + Sync {
    /// Current capacity of one (item, date)
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot answer
    fn get_availability<'a>(
        &'a self,
        item_id: &'a ItemId,
        date: NaiveDate,
    ) -> BoxFuture<'a, CollaboratorResult<AvailabilitySnapshot>>;

    /// Consume slots for every line, all or nothing
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::CapacityExhausted`] if any line no longer
    /// fits, or another error if the service fails. Nothing is committed on error.
    fn commit_reservation(&self, lines: Vec<CommitLine>) -> BoxFuture<'_, CollaboratorResult<()>>;
}

/// Ledger / notarization service
pub trait LedgerService: Send + Sync {
    /// Record a transaction reference on the ledger
    ///
    /// # Errors
    ///
    /// Returns error if the ledger is unreachable
    fn notarize<'a>(
        &'a self,
        transaction_ref: &'a TransactionRef,
    ) -> BoxFuture<'a, CollaboratorResult<Notarization>>;

    /// Look up the status of an earlier notarization
    ///
    /// # Errors
    ///
    /// Returns error if the ledger is unreachable
    fn status<'a>(&'a self, external_ref: &'a str) -> BoxFuture<'a, CollaboratorResult<AuditStatus>>;
}

/// Read-only catalog
pub trait CatalogService: Send + Sync {
    /// All published items
    ///
    /// # Errors
    ///
    /// Returns error if the catalog is unreachable
    fn list_items(&self) -> BoxFuture<'_, CollaboratorResult<Vec<CatalogItem>>>;

    /// One item, `None` if unknown
    ///
    /// # Errors
    ///
    /// Returns error if the catalog is unreachable
    fn get_item<'a>(
        &'a self,
        item_id: &'a ItemId,
    ) -> BoxFuture<'a, CollaboratorResult<Option<CatalogItem>>>;
}

/// What the engine asks the payment rail to settle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// Reference shared with the ledger
    pub transaction_ref: TransactionRef,
    /// Amount in pesos
    pub amount: Money,
    /// Estimated USDT amount for crypto rails
    pub usdt_amount: Option<f64>,
    /// Rail
    pub method: PaymentMethod,
}

/// Proof of a settled payment, needed to refund it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Gateway-side reference
    pub settlement_ref: String,
    /// Reference shared with the ledger
    pub transaction_ref: TransactionRef,
    /// Amount settled
    pub amount: Money,
    /// Rail
    pub method: PaymentMethod,
}

/// Payment rail abstraction (PayU, Binance Pay, Hedera)
pub trait PaymentGateway: Send + Sync {
    /// Settle a payment
    ///
    /// # Errors
    ///
    /// Returns error if the payment is declined or the rail is down
    fn settle(&self, request: SettlementRequest) -> BoxFuture<'_, CollaboratorResult<SettlementReceipt>>;

    /// Refund a settled payment
    ///
    /// # Errors
    ///
    /// Returns error if the refund cannot be issued
    fn refund<'a>(&'a self, receipt: &'a SettlementReceipt) -> BoxFuture<'a, CollaboratorResult<()>>;
}

/// Bound a collaborator call by `timeout`
///
/// # Errors
///
/// Returns [`CollaboratorError::Timeout`] if the call does not finish in time,
/// otherwise whatever the call returned.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> CollaboratorResult<T>
where
    F: Future<Output = CollaboratorResult<T>>,
{
    tokio::time::timeout(timeout, call).await.unwrap_or_else(|_| {
        Err(CollaboratorError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        ))
    })
}
