//! # Tourbroker Testing
//!
//! Testing utilities for tourbroker reducers and stores.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`test_clock`])
//! - A Given-When-Then builder for reducers ([`ReducerTest`])
//! - Effect assertion helpers
//! - One-shot tracing setup for tests that want log output
//!
//! ## Example
//!
//! ```ignore
//! use tourbroker_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(CheckoutReducer)
//!     .with_env(test_environment())
//!     .given_state(CheckoutState::default())
//!     .when_action(CheckoutAction::Proceed)
//!     .then_state(|state| assert!(state.last_error.is_some()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use tourbroker_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tourbroker_testing::mocks::FixedClock;
    /// use tourbroker_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        // 2025-01-01T00:00:00Z
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

/// Install a `fmt` subscriber honouring `RUST_LOG`, once per test binary.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
