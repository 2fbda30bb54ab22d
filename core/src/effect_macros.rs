//! Declarative macros for ergonomic effect construction
//!
//! Reducers frequently need to report an outcome back to themselves, or to run
//! one async call against a collaborator and turn its result into an action.
//! These macros remove the `Box::pin(async move { ... })` boilerplate.

/// Create an `Effect::Future` that immediately feeds `action` back into the store
///
/// # Example
///
/// ```rust,ignore
/// use tourbroker_core::emit;
///
/// smallvec![emit!(CheckoutAction::LineAdded { line_id })]
/// ```
#[macro_export]
macro_rules! emit {
    ($action:expr) => {{
        let action = $action;
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            ::std::option::Option::Some(action)
        }))
    }};
}

/// Create an `Effect::Future` from an async block that yields an action
///
/// The block must evaluate to the action itself; it is wrapped in `Some`.
///
/// # Example
///
/// ```rust,ignore
/// use tourbroker_core::async_effect;
///
/// async_effect! {
///     let snapshot = gate.check_availability(&item_id, date).await;
///     CheckoutAction::AvailabilityChecked { request, snapshot }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            ::std::option::Option::Some({ $($body)* })
        }))
    };
}
