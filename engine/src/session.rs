//! Request/response façade over the checkout store.
//!
//! Each call sends one action, waits until every effect it triggered (and the
//! actions those effects fed back) has finished, then reads the outcome from
//! state. Callers never see the intermediate `*Checked` / `*Resolved` steps.

use crate::audit::reconcile_audit;
use crate::cart::{AddLine, Cart, CartTotals};
use crate::checkout::{CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutStage, CheckoutState};
use crate::error::EngineError;
use crate::types::{AuditRecord, CatalogItem, ItemId, LineId, PaymentMethod, Reservation, TravelerInfo};
use std::time::Duration;
use thiserror::Error;
use tourbroker_runtime::{Store, StoreError};

/// Errors from a session call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The engine rejected the input or a collaborator failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The session's store is shutting down
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An add settled without an error but reported no line
    #[error("add finished without reporting a line")]
    MissingLine,
}

impl SessionError {
    /// The engine error, if this is one
    #[must_use]
    pub const fn engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(error) => Some(error),
            Self::Store(_) | Self::MissingLine => None,
        }
    }
}

/// Navigation inputs accepted by [`CheckoutSession::advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutInput {
    /// Cart → `TravelerInfo`
    Proceed,
    /// `TravelerInfo` → `PaymentSelection`
    SubmitTraveler(TravelerInfo),
    /// `PaymentSelection` → Processing → Success (or back on failure)
    ConfirmPayment(PaymentMethod),
    /// One stage back
    Back,
    /// Fresh empty session
    StartOver,
}

impl From<CheckoutInput> for CheckoutAction {
    fn from(input: CheckoutInput) -> Self {
        match input {
            CheckoutInput::Proceed => Self::Proceed,
            CheckoutInput::SubmitTraveler(traveler) => Self::SubmitTraveler(traveler),
            CheckoutInput::ConfirmPayment(method) => Self::ConfirmPayment(method),
            CheckoutInput::Back => Self::Back,
            CheckoutInput::StartOver => Self::StartOver,
        }
    }
}

type CheckoutStore = Store<CheckoutState, CheckoutAction, CheckoutEnvironment, CheckoutReducer>;

/// One traveler's checkout session
pub struct CheckoutSession {
    store: CheckoutStore,
    environment: CheckoutEnvironment,
}

impl CheckoutSession {
    /// New session with an empty cart
    #[must_use]
    pub fn new(environment: CheckoutEnvironment) -> Self {
        Self {
            store: Store::new(CheckoutState::default(), CheckoutReducer::new(), environment.clone()),
            environment,
        }
    }

    /// Send `action`, wait for its cascade, report `last_error`
    async fn dispatch(&self, action: CheckoutAction) -> Result<(), SessionError> {
        let mut handle = self.store.send(action).await?;
        handle.wait().await;
        match self.store.state(|s| s.last_error.clone()).await {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    async fn added_line(&self) -> Result<LineId, SessionError> {
        self.store
            .state(|s| s.last_added_line)
            .await
            .ok_or(SessionError::MissingLine)
    }

    /// Add `item` after an advisory capacity check
    ///
    /// # Errors
    ///
    /// Validation and capacity errors from the add.
    pub async fn add_to_cart(&self, item: CatalogItem, request: AddLine) -> Result<LineId, SessionError> {
        self.dispatch(CheckoutAction::AddToCart {
            line_id: LineId::new(),
            item,
            request,
        })
        .await?;
        self.added_line().await
    }

    /// Look `item_id` up in the catalog and add it
    ///
    /// # Errors
    ///
    /// Unknown or inactive items, catalog outages, and the errors of
    /// [`add_to_cart`](Self::add_to_cart).
    pub async fn add_catalog_item(&self, item_id: ItemId, request: AddLine) -> Result<LineId, SessionError> {
        self.dispatch(CheckoutAction::AddCatalogItem {
            line_id: LineId::new(),
            item_id,
            request,
        })
        .await?;
        self.added_line().await
    }

    /// Remove a line
    ///
    /// # Errors
    ///
    /// Unknown line, or the cart is locked.
    pub async fn remove_from_cart(&self, line_id: LineId) -> Result<(), SessionError> {
        self.dispatch(CheckoutAction::RemoveLine { line_id }).await
    }

    /// Empty the cart
    ///
    /// # Errors
    ///
    /// The cart is locked.
    pub async fn clear_cart(&self) -> Result<(), SessionError> {
        self.dispatch(CheckoutAction::ClearCart).await
    }

    /// Total price and item count
    pub async fn totals(&self) -> CartTotals {
        self.store.state(|s| CartTotals::from(&s.cart)).await
    }

    /// Snapshot of the cart
    pub async fn cart(&self) -> Cart {
        self.store.state(|s| s.cart.clone()).await
    }

    /// Current stage
    pub async fn current_state(&self) -> CheckoutStage {
        self.store.state(|s| s.stage).await
    }

    /// Apply a navigation input and return the resulting stage
    ///
    /// `ConfirmPayment` runs the whole processing pipeline before returning.
    ///
    /// # Errors
    ///
    /// The input was rejected, or processing failed (the session is then back
    /// in `PaymentSelection`).
    pub async fn advance(&self, input: CheckoutInput) -> Result<CheckoutStage, SessionError> {
        self.dispatch(input.into()).await?;
        Ok(self.current_state().await)
    }

    /// Reservation of a successful checkout
    pub async fn reservation(&self) -> Option<Reservation> {
        self.store.state(|s| s.reservation.clone()).await
    }

    /// Reconcile the audit record of the reservation, if any
    ///
    /// Returns the up-to-date record; the stored reservation is not modified.
    ///
    /// # Errors
    ///
    /// The ledger is unreachable.
    pub async fn reconcile_audit(&self) -> Result<Option<AuditRecord>, SessionError> {
        let Some(record) = self.store.state(|s| s.reservation.as_ref().map(|r| r.audit.clone())).await else {
            return Ok(None);
        };
        let timeout = self.environment.config.capacity.collaborator_timeout;
        let updated = reconcile_audit(self.environment.ledger.as_ref(), &record, timeout).await?;
        Ok(Some(updated))
    }

    /// Stop accepting input and wait for running effects
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownTimeout`] if effects are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), SessionError> {
        Ok(self.store.shutdown(timeout).await?)
    }
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn only_engine_errors_expose_an_engine_error() {
        let engine = SessionError::from(EngineError::from(ValidationError::NonPositiveQuantity));
        assert_eq!(
            engine.engine(),
            Some(&EngineError::from(ValidationError::NonPositiveQuantity))
        );
        assert!(SessionError::MissingLine.engine().is_none());
        assert!(
            !SessionError::MissingLine
                .to_string()
                .contains("unavailable")
        );
    }
}
