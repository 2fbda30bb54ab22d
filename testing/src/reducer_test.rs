//! Given-When-Then harness for reducers.
//!
//! A reducer is a pure function of (state, action, environment), so a test
//! only needs to seed state, apply one action and look at what came out. No
//! store or runtime is involved and returned effects are never executed.

#![allow(clippy::module_name_repetitions)]

use tourbroker_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;

type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// One reducer scenario, built up step by step and checked by [`run`](Self::run)
///
/// ```ignore
/// use tourbroker_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(CheckoutReducer)
///     .with_env(test_environment())
///     .given_state(state_with_cart())
///     .when_action(CheckoutAction::Proceed)
///     .then_state(|state| assert_eq!(state.stage, CheckoutStage::TravelerInfo))
///     .then_effects(|effects| assertions::assert_no_effects(effects))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup: Vec<A>,
    action: Option<A>,
    state_checks: Vec<StateCheck<S>>,
    effect_checks: Vec<EffectCheck<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Scenario for `reducer` with nothing seeded yet
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup: Vec::new(),
            action: None,
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment handed to every reduce call
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// State before anything is reduced
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Reduce `actions` against the initial state before the action under test
    ///
    /// Effects produced by these actions are discarded; only the effects of
    /// [`when_action`](Self::when_action) reach the effect checks.
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.setup.extend(actions);
        self
    }

    /// The action whose outcome is checked
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Check the state left behind
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check the effects returned by the action under test
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce the setup actions and the action under test, then run every check
    ///
    /// # Panics
    ///
    /// Panics when the state, action or environment was never given, and
    /// whenever a check fails.
    #[allow(clippy::panic)]
    #[allow(clippy::expect_used)]
    pub fn run(self) {
        let mut state = self.initial_state.expect("call given_state() first");
        let action = self.action.expect("call when_action() first");
        let env = self.environment.expect("call with_env() first");

        for earlier in self.setup {
            let _ = self.reducer.reduce(&mut state, earlier, &env);
        }
        let effects = self.reducer.reduce(&mut state, action, &env);

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(&effects);
        }
    }
}

/// Checks over the effects a reducer returned
pub mod assertions {
    use tourbroker_core::effect::Effect;

    /// Nothing to run: an empty list or a lone `Effect::None`
    ///
    /// # Panics
    ///
    /// Panics if any real effect was returned.
    #[allow(clippy::panic)]
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "expected no work, got {} effect(s): {effects:?}",
            effects.len()
        );
    }

    /// Exactly `expected` effects, `Effect::None` included
    ///
    /// # Panics
    ///
    /// Panics on any other count.
    #[allow(clippy::panic)]
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "expected {expected} effect(s), got {}",
            effects.len()
        );
    }

    /// At least one async effect, such as a collaborator call
    ///
    /// # Panics
    ///
    /// Panics if every effect is `Effect::None`.
    #[allow(clippy::panic)]
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|effect| matches!(effect, Effect::Future(_))),
            "expected an async effect, got none"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourbroker_core::effect::Effect;
    use tourbroker_core::{SmallVec, async_effect, smallvec};

    #[derive(Clone, Debug)]
    struct Seats {
        held: u32,
    }

    #[derive(Clone, Debug)]
    enum SeatAction {
        Hold,
        Release,
        Confirm,
        Confirmed,
    }

    struct SeatReducer;

    struct NoEnv;

    impl Reducer for SeatReducer {
        type State = Seats;
        type Action = SeatAction;
        type Environment = NoEnv;

        fn reduce(
            &self,
            state: &mut Seats,
            action: SeatAction,
            _env: &NoEnv,
        ) -> SmallVec<[Effect<SeatAction>; 4]> {
            match action {
                SeatAction::Hold => state.held += 1,
                SeatAction::Release => state.held = state.held.saturating_sub(1),
                SeatAction::Confirm => {
                    return smallvec![async_effect! { SeatAction::Confirmed }];
                },
                SeatAction::Confirmed => {},
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn hold_takes_a_seat_without_side_effects() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(Seats { held: 0 })
            .when_action(SeatAction::Hold)
            .then_state(|state| assert_eq!(state.held, 1))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn setup_actions_are_reduced_first() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(Seats { held: 0 })
            .given_actions([SeatAction::Hold, SeatAction::Hold, SeatAction::Confirm])
            .when_action(SeatAction::Release)
            .then_state(|state| assert_eq!(state.held, 1))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn confirm_returns_an_async_effect() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(Seats { held: 2 })
            .when_action(SeatAction::Confirm)
            .then_state(|state| assert_eq!(state.held, 2))
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    #[should_panic(expected = "expected no work")]
    fn async_effect_is_not_nothing() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(Seats { held: 0 })
            .when_action(SeatAction::Confirm)
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn empty_and_none_both_count_as_no_effects() {
        assertions::assert_no_effects::<SeatAction>(&[]);
        assertions::assert_no_effects::<SeatAction>(&[Effect::None]);
        assertions::assert_effects_count::<SeatAction>(&[], 0);
    }
}
