//! # Tourbroker Engine
//!
//! Reservation and dynamic pricing engine for a tourism marketplace broker.
//!
//! Travelers assemble carts and multi-day itineraries from a finite-capacity
//! catalog (tours, lodging nights, transport legs, packages), get a
//! deterministic price, and check out without overselling any unit's daily
//! capacity.
//!
//! ## Components
//!
//! ```text
//! CapacityGate ─────────────┐
//! PriceResolver ──► Cart ───┼──► CheckoutReducer ──► processing pipeline
//! AllocationCalculator ─┬───┘         (Store)         re-check → settle → commit → notarize
//!                       ├──► ItineraryAggregator
//!                       └──► GroupQuoteCalculator
//! ```
//!
//! - [`capacity`]: advisory and authoritative availability checks
//! - [`pricing`]: flat, occupancy-tiered and passenger-tiered line prices
//! - [`allocation`]: rooms and vehicles for a party
//! - [`itinerary`]: day plans and their net / sale-price quotes
//! - [`group_quote`]: single-shot group quote at fixed rates
//! - [`cart`]: priced lines with merge rules
//! - [`checkout`]: the checkout state machine as a reducer
//! - [`processing`]: the checkout pipeline run as an effect
//! - [`session`]: request/response façade over the checkout store
//! - [`collaborators`]: inventory, ledger, catalog and payment interfaces
//! - [`mocks`]: in-memory collaborators
//!
//! ## Example
//!
//! ```ignore
//! let session = CheckoutSession::new(environment);
//! session.add_to_cart(tour, AddLine::new(2, date)).await?;
//! session.advance(CheckoutInput::Proceed).await?;
//! session.advance(CheckoutInput::SubmitTraveler(traveler)).await?;
//! let stage = session.advance(CheckoutInput::ConfirmPayment(PaymentMethod::PayU)).await?;
//! assert_eq!(stage, CheckoutStage::Success);
//! ```

pub mod allocation;
pub mod audit;
pub mod capacity;
pub mod cart;
pub mod checkout;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod group_quote;
pub mod itinerary;
pub mod mocks;
pub mod pricing;
pub mod processing;
pub mod session;
pub mod types;

pub use allocation::{Allocation, AllocationCalculator};
pub use audit::reconcile_audit;
pub use capacity::CapacityGate;
pub use cart::{AddLine, Cart, CartTotals, LineItem};
pub use checkout::{CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutStage, CheckoutState};
pub use config::{EngineConfig, Margin};
pub use error::{CapacityError, CollaboratorError, EngineError, ValidationError};
pub use group_quote::{GroupQuote, GroupQuoteCalculator};
pub use itinerary::{ItineraryAggregator, ItineraryPlan, ItineraryQuote};
pub use pricing::{LinePrice, PriceResolver};
pub use session::{CheckoutInput, CheckoutSession, SessionError};
pub use types::*;
