//! Capacity gate over the external inventory service.
//!
//! Two kinds of question are asked of the capacity pool:
//!
//! - **Advisory** ([`CapacityGate::check_availability`]), when a line is added
//!   to a cart. If inventory is down the gate answers with a fallback snapshot
//!   so browsing keeps working.
//! - **Authoritative** ([`CapacityGate::authoritative`],
//!   [`CapacityGate::verify_demand`]), inside checkout. No fallback: an
//!   unreachable inventory fails the step.
//!
//! Nothing is cached. Every call goes to the collaborator.

use crate::collaborators::{InventoryService, bounded};
use crate::config::CapacityConfig;
use crate::error::{CapacityError, EngineError};
use crate::types::{AvailabilitySnapshot, ItemId};
use chrono::NaiveDate;
use std::sync::Arc;

/// Demand for one (item, date), summed over cart lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    /// Item
    pub item_id: ItemId,
    /// Date
    pub date: NaiveDate,
    /// Slots requested
    pub quantity: u32,
}

/// Answers "can N units of item X on date D be added"
#[derive(Clone)]
pub struct CapacityGate {
    inventory: Arc<dyn InventoryService>,
    config: CapacityConfig,
}

impl CapacityGate {
    /// Creates a gate over `inventory`
    #[must_use]
    pub fn new(inventory: Arc<dyn InventoryService>, config: CapacityConfig) -> Self {
        Self { inventory, config }
    }

    /// Advisory snapshot for cart-building
    ///
    /// Falls back to an unblocked snapshot of `fallback_capacity` slots when the
    /// inventory service fails. Such a snapshot reports
    /// [`is_authoritative`](AvailabilitySnapshot::is_authoritative) `false`.
    #[tracing::instrument(skip(self, item_id), fields(item_id = %item_id))]
    pub async fn check_availability(&self, item_id: &ItemId, date: NaiveDate) -> AvailabilitySnapshot {
        match bounded(
            self.config.collaborator_timeout,
            self.inventory.get_availability(item_id, date),
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(
                    %date,
                    error = %error,
                    fallback_capacity = self.config.fallback_capacity,
                    "Inventory unavailable, using advisory fallback snapshot"
                );
                metrics::counter!("capacity.fallback_used").increment(1);
                AvailabilitySnapshot::fallback(self.config.fallback_capacity)
            },
        }
    }

    /// Fresh snapshot for a commit decision
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorUnavailable` if inventory fails or times out.
    #[tracing::instrument(skip(self, item_id), fields(item_id = %item_id))]
    pub async fn authoritative(
        &self,
        item_id: &ItemId,
        date: NaiveDate,
    ) -> Result<AvailabilitySnapshot, EngineError> {
        bounded(
            self.config.collaborator_timeout,
            self.inventory.get_availability(item_id, date),
        )
        .await
        .map_err(|error| EngineError::from_collaborator("inventory", error))
    }

    /// Re-check every (item, date) of a checkout, in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns a [`CapacityError`] for a blocked or short date, or
    /// `CollaboratorUnavailable` if inventory cannot answer.
    pub async fn verify_demand(&self, demand: &[Demand]) -> Result<(), EngineError> {
        for entry in demand {
            let snapshot = self.authoritative(&entry.item_id, entry.date).await?;
            ensure_admits(&snapshot, &entry.item_id, entry.date, entry.quantity)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CapacityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapacityGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Turn a snapshot into a capacity decision for `requested` slots
///
/// # Errors
///
/// [`CapacityError::Blocked`] if the date is closed, otherwise
/// [`CapacityError::Insufficient`] if fewer than `requested` slots remain.
pub fn ensure_admits(
    snapshot: &AvailabilitySnapshot,
    item_id: &ItemId,
    date: NaiveDate,
    requested: u32,
) -> Result<(), CapacityError> {
    if snapshot.blocked {
        return Err(CapacityError::Blocked {
            item_id: item_id.clone(),
            date,
        });
    }
    if !snapshot.admits(requested) {
        return Err(CapacityError::Insufficient {
            item_id: item_id.clone(),
            date,
            requested,
            remaining: snapshot.remaining(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::InMemoryInventory;
    use std::time::Duration;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn config() -> CapacityConfig {
        CapacityConfig {
            fallback_capacity: 10,
            collaborator_timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn advisory_check_falls_back_when_inventory_is_down() {
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.fail_reads(true);
        let gate = CapacityGate::new(inventory, config());

        let snapshot = gate.check_availability(&ItemId::new("tour"), date()).await;
        assert_eq!(snapshot, AvailabilitySnapshot::fallback(10));
    }

    #[tokio::test]
    async fn authoritative_check_never_falls_back() {
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.fail_reads(true);
        let gate = CapacityGate::new(inventory, config());

        let result = gate.authoritative(&ItemId::new("tour"), date()).await;
        assert!(matches!(
            result,
            Err(EngineError::CollaboratorUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn verify_demand_reports_blocked_dates() {
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.set_capacity(&ItemId::new("tour"), date(), 20);
        inventory.block(&ItemId::new("kayak"), date());
        let gate = CapacityGate::new(inventory, config());

        let demand = vec![
            Demand {
                item_id: ItemId::new("tour"),
                date: date(),
                quantity: 4,
            },
            Demand {
                item_id: ItemId::new("kayak"),
                date: date(),
                quantity: 1,
            },
        ];
        let error = gate.verify_demand(&demand).await.unwrap_err();
        assert_eq!(
            error,
            EngineError::Capacity(CapacityError::Blocked {
                item_id: ItemId::new("kayak"),
                date: date(),
            })
        );
    }

    #[test]
    fn ensure_admits_reports_remaining() {
        let snapshot = AvailabilitySnapshot::live(10, 8, false);
        let error = ensure_admits(&snapshot, &ItemId::new("tour"), date(), 3).unwrap_err();
        assert_eq!(
            error,
            CapacityError::Insufficient {
                item_id: ItemId::new("tour"),
                date: date(),
                requested: 3,
                remaining: 2,
            }
        );
    }
}
