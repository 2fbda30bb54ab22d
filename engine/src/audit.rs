//! Reconciliation of pending audit records.

use crate::collaborators::{LedgerService, bounded};
use crate::error::EngineError;
use crate::types::{AuditRecord, AuditStatus};
use std::time::Duration;

/// Bring a `pending` record up to date with the ledger
///
/// With an external reference the ledger is asked for its status; without one
/// (notarization never reached the ledger) the transaction is notarized again.
/// Records that are not pending are returned unchanged.
///
/// # Errors
///
/// Returns `CollaboratorUnavailable` if the ledger fails or times out.
#[tracing::instrument(skip(ledger, record), fields(transaction_ref = %record.transaction_ref))]
pub async fn reconcile_audit(
    ledger: &dyn LedgerService,
    record: &AuditRecord,
    timeout: Duration,
) -> Result<AuditRecord, EngineError> {
    if record.status != AuditStatus::Pending {
        return Ok(record.clone());
    }

    let updated = match &record.external_ref {
        Some(external_ref) => {
            let status = bounded(timeout, ledger.status(external_ref))
                .await
                .map_err(|error| EngineError::from_collaborator("ledger", error))?;
            AuditRecord {
                status,
                ..record.clone()
            }
        },
        None => {
            let notarization = bounded(timeout, ledger.notarize(&record.transaction_ref))
                .await
                .map_err(|error| EngineError::from_collaborator("ledger", error))?;
            AuditRecord::notarized(record.transaction_ref.clone(), notarization)
        },
    };

    tracing::info!(status = ?updated.status, "Audit record reconciled");
    Ok(updated)
}
