//! The checkout processing pipeline.
//!
//! Strictly sequential; each step runs only if the previous one succeeded:
//!
//! 1. Authoritative capacity re-check of every (item, date), no fallback
//! 2. Payment settlement
//! 3. Inventory commit (all lines at once). On failure the settlement is refunded.
//! 4. Notarization. Failure here does not undo the booking; the audit stays `pending`.
//!
//! Nothing is retried automatically. A failed run leaves inventory untouched
//! and the caller may resubmit, which starts again from step 1.

use crate::cart::Cart;
use crate::checkout::CheckoutEnvironment;
use crate::collaborators::{SettlementReceipt, SettlementRequest, bounded};
use crate::error::EngineError;
use crate::types::{AuditRecord, PaymentMethod, Reservation, ReservationId, TransactionRef, TravelerInfo};

/// Everything the pipeline needs from the session
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Cart as it was when payment was confirmed
    pub cart: Cart,
    /// Lead traveler
    pub traveler: TravelerInfo,
    /// Rail
    pub method: PaymentMethod,
}

/// Run the pipeline for `request`
///
/// # Errors
///
/// - [`EngineError::Capacity`] if a date is blocked or short at re-check time,
///   or inventory refuses the commit for lack of capacity
/// - [`EngineError::CollaboratorUnavailable`] if inventory or the payment rail
///   fails or times out
///
/// A ledger failure is not an error.
#[tracing::instrument(
    skip_all,
    fields(method = ?request.method, lines = request.cart.lines().len())
)]
pub async fn run_checkout(
    env: &CheckoutEnvironment,
    request: CheckoutRequest,
) -> Result<Reservation, EngineError> {
    let timeout = env.config.capacity.collaborator_timeout;
    let CheckoutRequest {
        cart,
        traveler,
        method,
    } = request;

    env.gate.verify_demand(&cart.demand()).await?;
    tracing::debug!("Capacity re-check passed");

    let total = cart.total_price();
    let transaction_ref = TransactionRef::generate(method, env.clock.now());
    let settlement = SettlementRequest {
        transaction_ref: transaction_ref.clone(),
        amount: total,
        usdt_amount: method
            .is_crypto()
            .then(|| total.to_usdt(env.config.payment.cop_per_usdt)),
        method,
    };
    let receipt = bounded(timeout, env.payments.settle(settlement))
        .await
        .map_err(|error| EngineError::from_collaborator("payment", error))?;
    tracing::debug!(settlement_ref = %receipt.settlement_ref, "Payment settled");

    if let Err(error) = bounded(timeout, env.inventory.commit_reservation(cart.commit_lines())).await {
        tracing::warn!(error = %error, "Inventory commit failed, refunding settlement");
        refund(env, &receipt).await;
        return Err(EngineError::from_collaborator("inventory", error));
    }
    tracing::debug!("Inventory committed");

    let audit = match bounded(timeout, env.ledger.notarize(&transaction_ref)).await {
        Ok(notarization) => AuditRecord::notarized(transaction_ref, notarization),
        Err(error) => {
            tracing::warn!(
                transaction_ref = %transaction_ref,
                error = %error,
                "Notarization failed, audit left pending for reconciliation"
            );
            AuditRecord::pending(transaction_ref)
        },
    };

    Ok(Reservation {
        id: ReservationId::new(),
        lines: cart.lines().to_vec(),
        total,
        payment_method: method,
        settlement_ref: receipt.settlement_ref,
        traveler,
        audit,
        created_at: env.clock.now(),
    })
}

/// Compensate a settlement whose booking could not be committed
async fn refund(env: &CheckoutEnvironment, receipt: &SettlementReceipt) {
    let timeout = env.config.capacity.collaborator_timeout;
    match bounded(timeout, env.payments.refund(receipt)).await {
        Ok(()) => tracing::info!(settlement_ref = %receipt.settlement_ref, "Settlement refunded"),
        Err(error) => tracing::error!(
            settlement_ref = %receipt.settlement_ref,
            amount = %receipt.amount,
            error = %error,
            "Refund failed after inventory commit failure; manual follow-up required"
        ),
    }
}
