//! Error taxonomy for the engine.
//!
//! Three families reach callers through [`EngineError`]:
//!
//! - [`ValidationError`]: bad input, rejected before any collaborator call
//! - [`CapacityError`]: the date is closed or short of slots ("sold out")
//! - `CollaboratorUnavailable`: a collaborator failed or timed out ("try again")
//!
//! Collaborators themselves speak [`CollaboratorError`], which is converted at
//! the engine boundary.

use crate::types::{ItemId, LineId, SelectionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input rejected before any collaborator is consulted
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// Checkout attempted with nothing in the cart
    #[error("cart is empty")]
    EmptyCart,

    /// Traveler form has blank required fields
    #[error("traveler information incomplete: missing {}", missing.join(", "))]
    IncompleteTravelerInfo {
        /// Field names left blank
        missing: Vec<String>,
    },

    /// Quantity of zero
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    /// Lodging line with zero nights
    #[error("lodging requires at least one night")]
    NonPositiveNights,

    /// More guests than the room takes
    #[error("{guests} guests exceed the room maximum of {max_guests}")]
    GuestsExceedRoom {
        /// Requested guests
        guests: u32,
        /// Room maximum
        max_guests: u32,
    },

    /// Party too big for a zone fare
    #[error("party of {party} exceeds the transport maximum of {max}")]
    PartyTooLarge {
        /// Requested party size
        party: u32,
        /// Largest accepted party
        max: u32,
    },

    /// Item withdrawn from sale
    #[error("item {0} is not active")]
    InactiveItem(ItemId),

    /// Item not found in the catalog
    #[error("item {0} not found in catalog")]
    UnknownItem(ItemId),

    /// Line not found in the cart
    #[error("line {0} not found in cart")]
    UnknownLine(LineId),

    /// Price arithmetic overflowed
    #[error("price overflow")]
    PriceOverflow,

    /// Booking requires at least one adult
    #[error("a booking requires at least one adult")]
    MissingAdult,

    /// Date outside the itinerary range
    #[error("{0} is outside the itinerary dates")]
    DateOutsidePlan(NaiveDate),

    /// End date before start date
    #[error("itinerary end {end} precedes start {start}")]
    InvalidDateRange {
        /// First day
        start: NaiveDate,
        /// Last day
        end: NaiveDate,
    },

    /// Selection not found in the itinerary
    #[error("selection {0} not found in itinerary")]
    UnknownSelection(SelectionId),

    /// Input not accepted in the current checkout stage
    #[error("{input} is not allowed while in stage {stage}")]
    InvalidTransition {
        /// Stage name
        stage: String,
        /// Input name
        input: String,
    },

    /// Cart edits happen only before checkout starts
    #[error("cart can only be edited before checkout starts")]
    CartLocked,
}

/// The capacity pool cannot take the requested quantity
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityError {
    /// Date closed for sale
    #[error("{item_id} is blocked on {date}")]
    Blocked {
        /// Item
        item_id: ItemId,
        /// Date
        date: NaiveDate,
    },

    /// Not enough free slots
    #[error("{item_id} on {date}: requested {requested}, only {remaining} left")]
    Insufficient {
        /// Item
        item_id: ItemId,
        /// Date
        date: NaiveDate,
        /// Total demanded for the date
        requested: u32,
        /// Free slots at check time
        remaining: u32,
    },

    /// Inventory refused the commit; another session took the last slots
    #[error("{item_id} sold out on {date}")]
    Exhausted {
        /// Item
        item_id: ItemId,
        /// Date
        date: NaiveDate,
    },
}

/// Failure reported by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollaboratorError {
    /// Service unreachable or erroring
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// No answer within the configured timeout
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Service answered but refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Inventory refused a commit for lack of capacity
    #[error("capacity exhausted for {item_id} on {date}")]
    CapacityExhausted {
        /// Item
        item_id: ItemId,
        /// Date
        date: NaiveDate,
    },
}

/// Errors surfaced by the engine
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineError {
    /// Bad input; fix and resubmit
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Sold out or closed
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// A collaborator failed; the same request may be retried
    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        /// Which collaborator
        collaborator: String,
        /// What it reported
        message: String,
    },
}

impl EngineError {
    /// Wraps a collaborator failure
    ///
    /// `CapacityExhausted` is a capacity answer, not an outage, and keeps its meaning.
    #[must_use]
    pub fn from_collaborator(collaborator: &str, error: CollaboratorError) -> Self {
        match error {
            CollaboratorError::CapacityExhausted { item_id, date } => {
                Self::Capacity(CapacityError::Exhausted { item_id, date })
            },
            other => Self::CollaboratorUnavailable {
                collaborator: collaborator.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Only collaborator outages are worth resubmitting unchanged
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::CollaboratorUnavailable { .. })
    }

    /// Short label for metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Capacity(_) => "capacity",
            Self::CollaboratorUnavailable { .. } => "collaborator",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default()
    }

    #[test]
    fn exhausted_commit_is_a_capacity_error() {
        let error = EngineError::from_collaborator(
            "inventory",
            CollaboratorError::CapacityExhausted {
                item_id: ItemId::new("tour-acuario"),
                date: date(),
            },
        );
        assert!(matches!(error, EngineError::Capacity(_)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn outages_are_retryable() {
        let error = EngineError::from_collaborator("ledger", CollaboratorError::Timeout(5000));
        assert!(error.is_retryable());
        assert_eq!(error.to_string(), "ledger unavailable: timed out after 5000 ms");
        assert_eq!(error.kind(), "collaborator");
    }

    #[test]
    fn validation_messages() {
        let error: EngineError = ValidationError::IncompleteTravelerInfo {
            missing: vec!["email".into(), "country".into()],
        }
        .into();
        assert_eq!(
            error.to_string(),
            "traveler information incomplete: missing email, country"
        );
        assert!(!error.is_retryable());
    }

    #[test]
    fn errors_serialize_for_transport() {
        let error = EngineError::Capacity(CapacityError::Blocked {
            item_id: ItemId::new("hotel-decameron"),
            date: date(),
        });
        let json = serde_json::to_string(&error).unwrap();
        let back: EngineError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }
}
