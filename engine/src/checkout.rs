//! Checkout state machine.
//!
//! ```text
//! Cart ──Proceed──► TravelerInfo ──SubmitTraveler──► PaymentSelection ──ConfirmPayment──► Processing ──► Success
//!  ▲                    │  ▲                               │                                │
//!  └───────Back─────────┘  └────────────Back───────────────┘◄──────── ProcessingFailed ──────┘
//! ```
//!
//! The reducer is pure. Collaborator calls (advisory capacity checks, catalog
//! lookups and the processing pipeline) are returned as effects whose results
//! come back as `*Checked`, `*Resolved`, `ProcessingCompleted` or
//! `ProcessingFailed` actions.
//!
//! Every user input clears `last_error`; a rejected input sets it and leaves
//! the rest of the state untouched.

use crate::capacity::{CapacityGate, ensure_admits};
use crate::cart::{AddLine, Cart};
use crate::collaborators::{CatalogService, InventoryService, LedgerService, PaymentGateway, bounded};
use crate::config::EngineConfig;
use crate::error::{EngineError, ValidationError};
use crate::pricing::PriceResolver;
use crate::processing::{CheckoutRequest, run_checkout};
use crate::types::{
    AvailabilitySnapshot, CatalogItem, ItemId, LineId, PaymentMethod, Reservation, TravelerInfo,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tourbroker_core::environment::Clock;
use tourbroker_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// Checkout stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutStage {
    /// Building the cart
    #[default]
    Cart,
    /// Collecting traveler details
    TravelerInfo,
    /// Choosing a payment rail
    PaymentSelection,
    /// Pipeline running; no input accepted
    Processing,
    /// Reservation created
    Success,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cart => "cart",
            Self::TravelerInfo => "traveler_info",
            Self::PaymentSelection => "payment_selection",
            Self::Processing => "processing",
            Self::Success => "success",
        };
        f.write_str(name)
    }
}

/// State of one checkout session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutState {
    /// Current stage
    pub stage: CheckoutStage,
    /// Cart being checked out
    pub cart: Cart,
    /// Traveler details, once submitted
    pub traveler: Option<TravelerInfo>,
    /// Chosen rail, once confirmed
    pub payment_method: Option<PaymentMethod>,
    /// Error from the most recent input
    pub last_error: Option<EngineError>,
    /// Line created or merged by the most recent successful add
    pub last_added_line: Option<LineId>,
    /// Result of a successful checkout
    pub reservation: Option<Reservation>,
}

/// Inputs to the checkout reducer
#[derive(Clone, Debug)]
pub enum CheckoutAction {
    // Cart editing
    /// Add `request` of `item` to the cart after an advisory capacity check
    AddToCart {
        /// Id for the line if a new one is created
        line_id: LineId,
        /// Item to add
        item: CatalogItem,
        /// Quantity, date and options
        request: AddLine,
    },
    /// Look `item_id` up in the catalog, then add it
    AddCatalogItem {
        /// Id for the line if a new one is created
        line_id: LineId,
        /// Item to look up
        item_id: ItemId,
        /// Quantity, date and options
        request: AddLine,
    },
    /// Catalog lookup finished
    CatalogItemResolved {
        /// Id for the line if a new one is created
        line_id: LineId,
        /// Lookup outcome
        result: Result<CatalogItem, EngineError>,
        /// Quantity, date and options
        request: AddLine,
    },
    /// Advisory capacity check finished
    AvailabilityChecked {
        /// Id for the line if a new one is created
        line_id: LineId,
        /// Item to add
        item: CatalogItem,
        /// Quantity, date and options
        request: AddLine,
        /// What inventory (or the fallback) answered
        snapshot: AvailabilitySnapshot,
    },
    /// Remove a line
    RemoveLine {
        /// Line to remove
        line_id: LineId,
    },
    /// Empty the cart
    ClearCart,

    // Navigation
    /// Cart → `TravelerInfo`
    Proceed,
    /// `TravelerInfo` → `PaymentSelection`
    SubmitTraveler(TravelerInfo),
    /// `PaymentSelection` → Processing
    ConfirmPayment(PaymentMethod),
    /// One stage back, before Processing
    Back,
    /// Abandon or finish: a fresh empty session
    StartOver,

    // Pipeline outcome
    /// Processing succeeded
    ProcessingCompleted {
        /// The reservation
        reservation: Box<Reservation>,
    },
    /// Processing failed
    ProcessingFailed {
        /// Why
        error: EngineError,
    },
}

impl CheckoutAction {
    fn name(&self) -> &'static str {
        match self {
            Self::AddToCart { .. } => "add_to_cart",
            Self::AddCatalogItem { .. } => "add_catalog_item",
            Self::CatalogItemResolved { .. } => "catalog_item_resolved",
            Self::AvailabilityChecked { .. } => "availability_checked",
            Self::RemoveLine { .. } => "remove_line",
            Self::ClearCart => "clear_cart",
            Self::Proceed => "proceed",
            Self::SubmitTraveler(_) => "submit_traveler",
            Self::ConfirmPayment(_) => "confirm_payment",
            Self::Back => "back",
            Self::StartOver => "start_over",
            Self::ProcessingCompleted { .. } => "processing_completed",
            Self::ProcessingFailed { .. } => "processing_failed",
        }
    }
}

/// Dependencies of the checkout reducer
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Capacity gate over inventory
    pub gate: CapacityGate,
    /// Inventory service (commit)
    pub inventory: Arc<dyn InventoryService>,
    /// Payment rail
    pub payments: Arc<dyn PaymentGateway>,
    /// Notarization ledger
    pub ledger: Arc<dyn LedgerService>,
    /// Catalog
    pub catalog: Arc<dyn CatalogService>,
    /// Clock for reservation timestamps and transaction references
    pub clock: Arc<dyn Clock>,
    /// Price resolver
    pub resolver: PriceResolver,
    /// Configuration
    pub config: Arc<EngineConfig>,
}

impl CheckoutEnvironment {
    /// Wire an environment from its collaborators
    #[must_use]
    pub fn new(
        config: EngineConfig,
        inventory: Arc<dyn InventoryService>,
        payments: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn LedgerService>,
        catalog: Arc<dyn CatalogService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate: CapacityGate::new(Arc::clone(&inventory), config.capacity.clone()),
            resolver: PriceResolver::new(&config.pricing),
            inventory,
            payments,
            ledger,
            catalog,
            clock,
            config: Arc::new(config),
        }
    }
}

impl fmt::Debug for CheckoutEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutEnvironment")
            .field("gate", &self.gate)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Reducer driving the checkout state machine
#[derive(Clone, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(
        state: &mut CheckoutState,
        error: impl Into<EngineError>,
    ) -> SmallVec<[Effect<CheckoutAction>; 4]> {
        let error = error.into();
        tracing::warn!(stage = %state.stage, error = %error, "Checkout input rejected");
        state.last_error = Some(error);
        smallvec![Effect::None]
    }

    fn invalid(state: &mut CheckoutState, action: &CheckoutAction) -> SmallVec<[Effect<CheckoutAction>; 4]> {
        let error = ValidationError::InvalidTransition {
            stage: state.stage.to_string(),
            input: action.name().to_string(),
        };
        Self::reject(state, error)
    }

    fn move_to(state: &mut CheckoutState, stage: CheckoutStage) {
        tracing::info!(from = %state.stage, to = %stage, "Checkout stage transition");
        state.stage = stage;
    }

    /// Synchronous checks, then the advisory capacity lookup
    fn begin_add(
        state: &mut CheckoutState,
        line_id: LineId,
        item: CatalogItem,
        request: AddLine,
        env: &CheckoutEnvironment,
    ) -> SmallVec<[Effect<CheckoutAction>; 4]> {
        if state.stage != CheckoutStage::Cart {
            return Self::reject(state, ValidationError::CartLocked);
        }
        let mut preview = state.cart.clone();
        if let Err(error) = preview.add(line_id, &item, &request, &env.resolver) {
            return Self::reject(state, error);
        }

        tracing::debug!(item_id = %item.id, date = %request.date, quantity = request.quantity, "Checking availability");
        let gate = env.gate.clone();
        smallvec![async_effect! {
            let snapshot = gate.check_availability(&item.id, request.date).await;
            CheckoutAction::AvailabilityChecked { line_id, item, request, snapshot }
        }]
    }

    fn finish_add(
        state: &mut CheckoutState,
        line_id: LineId,
        item: &CatalogItem,
        request: &AddLine,
        snapshot: &AvailabilitySnapshot,
        env: &CheckoutEnvironment,
    ) -> SmallVec<[Effect<CheckoutAction>; 4]> {
        if state.stage != CheckoutStage::Cart {
            return Self::reject(state, ValidationError::CartLocked);
        }
        let requested = state
            .cart
            .demand_for(&item.id, request.date)
            .saturating_add(request.slots(item.category));
        if let Err(error) = ensure_admits(snapshot, &item.id, request.date, requested) {
            return Self::reject(state, error);
        }
        match state.cart.add(line_id, item, request, &env.resolver) {
            Ok(id) => {
                tracing::debug!(item_id = %item.id, line_id = %id, "Line added to cart");
                state.last_added_line = Some(id);
                smallvec![Effect::None]
            },
            Err(error) => Self::reject(state, error),
        }
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per input
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let is_outcome = matches!(
            action,
            CheckoutAction::CatalogItemResolved { .. }
                | CheckoutAction::AvailabilityChecked { .. }
                | CheckoutAction::ProcessingCompleted { .. }
                | CheckoutAction::ProcessingFailed { .. }
        );
        if !is_outcome {
            state.last_error = None;
            state.last_added_line = None;
            if state.stage == CheckoutStage::Processing {
                return Self::invalid(state, &action);
            }
        }

        match action {
            CheckoutAction::AddToCart {
                line_id,
                item,
                request,
            } => Self::begin_add(state, line_id, item, request, env),

            CheckoutAction::AddCatalogItem {
                line_id,
                item_id,
                request,
            } => {
                if state.stage != CheckoutStage::Cart {
                    return Self::reject(state, ValidationError::CartLocked);
                }
                if request.quantity == 0 {
                    return Self::reject(state, ValidationError::NonPositiveQuantity);
                }
                let catalog = Arc::clone(&env.catalog);
                let timeout = env.config.capacity.collaborator_timeout;
                smallvec![async_effect! {
                    let lookup = bounded(timeout, catalog.get_item(&item_id)).await;
                    let result = match lookup {
                        Ok(Some(item)) => Ok(item),
                        Ok(None) => Err(ValidationError::UnknownItem(item_id).into()),
                        Err(error) => Err(EngineError::from_collaborator("catalog", error)),
                    };
                    CheckoutAction::CatalogItemResolved { line_id, result, request }
                }]
            },

            CheckoutAction::CatalogItemResolved {
                line_id,
                result,
                request,
            } => match result {
                Ok(item) => Self::begin_add(state, line_id, item, request, env),
                Err(error) => Self::reject(state, error),
            },

            CheckoutAction::AvailabilityChecked {
                line_id,
                item,
                request,
                snapshot,
            } => Self::finish_add(state, line_id, &item, &request, &snapshot, env),

            CheckoutAction::RemoveLine { line_id } => {
                if state.stage != CheckoutStage::Cart {
                    return Self::reject(state, ValidationError::CartLocked);
                }
                match state.cart.remove(line_id) {
                    Ok(_) => smallvec![Effect::None],
                    Err(error) => Self::reject(state, error),
                }
            },

            CheckoutAction::ClearCart => {
                if state.stage != CheckoutStage::Cart {
                    return Self::reject(state, ValidationError::CartLocked);
                }
                state.cart.clear();
                smallvec![Effect::None]
            },

            CheckoutAction::Proceed => match state.stage {
                CheckoutStage::Cart if state.cart.is_empty() => {
                    Self::reject(state, ValidationError::EmptyCart)
                },
                CheckoutStage::Cart => {
                    Self::move_to(state, CheckoutStage::TravelerInfo);
                    smallvec![Effect::None]
                },
                _ => Self::invalid(state, &CheckoutAction::Proceed),
            },

            CheckoutAction::SubmitTraveler(traveler) => {
                if state.stage != CheckoutStage::TravelerInfo {
                    return Self::invalid(state, &CheckoutAction::SubmitTraveler(traveler));
                }
                let missing = traveler.missing_fields();
                if !missing.is_empty() {
                    return Self::reject(state, ValidationError::IncompleteTravelerInfo { missing });
                }
                state.traveler = Some(traveler);
                Self::move_to(state, CheckoutStage::PaymentSelection);
                smallvec![Effect::None]
            },

            CheckoutAction::ConfirmPayment(method) => {
                if state.stage != CheckoutStage::PaymentSelection {
                    return Self::invalid(state, &CheckoutAction::ConfirmPayment(method));
                }
                let Some(traveler) = state.traveler.clone() else {
                    return Self::invalid(state, &CheckoutAction::ConfirmPayment(method));
                };
                state.payment_method = Some(method);
                Self::move_to(state, CheckoutStage::Processing);

                let env = env.clone();
                let request = CheckoutRequest {
                    cart: state.cart.clone(),
                    traveler,
                    method,
                };
                smallvec![async_effect! {
                    match run_checkout(&env, request).await {
                        Ok(reservation) => CheckoutAction::ProcessingCompleted {
                            reservation: Box::new(reservation),
                        },
                        Err(error) => CheckoutAction::ProcessingFailed { error },
                    }
                }]
            },

            CheckoutAction::Back => match state.stage {
                CheckoutStage::TravelerInfo => {
                    Self::move_to(state, CheckoutStage::Cart);
                    smallvec![Effect::None]
                },
                CheckoutStage::PaymentSelection => {
                    Self::move_to(state, CheckoutStage::TravelerInfo);
                    smallvec![Effect::None]
                },
                _ => Self::invalid(state, &CheckoutAction::Back),
            },

            CheckoutAction::StartOver => {
                tracing::info!(from = %state.stage, "Starting a new checkout session");
                *state = CheckoutState::default();
                smallvec![Effect::None]
            },

            CheckoutAction::ProcessingCompleted { reservation } => {
                if state.stage != CheckoutStage::Processing {
                    tracing::warn!(stage = %state.stage, "Ignoring processing result outside processing");
                    return smallvec![Effect::None];
                }
                tracing::info!(
                    reservation_id = %reservation.id,
                    total = %reservation.total,
                    audit_status = ?reservation.audit.status,
                    "Reservation created"
                );
                metrics::counter!("checkout.completed").increment(1);
                state.cart.clear();
                state.reservation = Some(*reservation);
                Self::move_to(state, CheckoutStage::Success);
                smallvec![Effect::None]
            },

            CheckoutAction::ProcessingFailed { error } => {
                if state.stage != CheckoutStage::Processing {
                    tracing::warn!(stage = %state.stage, "Ignoring processing result outside processing");
                    return smallvec![Effect::None];
                }
                tracing::warn!(error = %error, retryable = error.is_retryable(), "Checkout failed");
                metrics::counter!("checkout.failed", "reason" => error.kind()).increment(1);
                state.last_error = Some(error);
                Self::move_to(state, CheckoutStage::PaymentSelection);
                smallvec![Effect::None]
            },
        }
    }
}
