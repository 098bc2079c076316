//! # Doorlist Core
//!
//! Core traits and types for the Doorlist architecture.
//!
//! Every stateful feature in Doorlist is built as a reducer: a pure function
//! `(State, Action, Environment) → Effects` that validates a command, applies
//! the resulting transition in place, and returns descriptions of any side
//! effects to run afterwards. The runtime crate executes those effects and
//! serializes reducer calls, which is what makes the registration ledger's
//! capacity checks race-free.
//!
//! ## Core concepts
//!
//! - **State**: owned domain state for one aggregate instance
//! - **Action**: all possible inputs (commands and events) for a reducer
//! - **Reducer**: the business logic, deterministic and synchronous
//! - **Effect**: a side-effect *value* (not execution)
//! - **Environment**: injected dependencies behind traits
//!
//! Reducers being synchronous is a load-bearing property: a reducer cannot
//! await, so no I/O can happen while the runtime holds an aggregate's write
//! lock. Anything that needs to suspend is resolved before dispatch or
//! returned as an [`effect::Effect`].

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// The core trait for business logic.
///
/// Reducers are pure functions: `(State, Action, Environment) → Effects`.
/// They contain all validation and state transitions and are testable
/// without any runtime.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic.
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for RegistrationReducer {
    ///     type State = RegistrationState;
    ///     type Action = RegistrationAction;
    ///     type Environment = RegistrationEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut RegistrationState,
    ///         action: RegistrationAction,
    ///         env: &RegistrationEnvironment,
    ///     ) -> SmallVec<[Effect<RegistrationAction>; 4]> {
    ///         // validate, apply, describe effects
    ///         SmallVec::new()
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects.
        ///
        /// This must be deterministic given `(state, action, env)` and must
        /// leave `state` fully consistent on every path: either the whole
        /// transition is applied or the state is untouched apart from
        /// recording the rejection.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Side-effect descriptions returned by reducers.
///
/// Effects are values, not execution: the runtime's store interprets them
/// after the reducer has released the state lock.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// A side effect to be executed by the store runtime.
    ///
    /// Actions produced by effects are fed back into the reducer and
    /// broadcast to observers, which is how followers (dashboards, tests)
    /// see what happened without holding any lock.
    #[allow(missing_docs)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects in order, waiting for each to complete
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay (timeouts, reminders)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after the delay
            action: Box<Action>,
        },

        /// Arbitrary async computation.
        ///
        /// If the future resolves to `Some(action)`, the action is broadcast
        /// and fed back into the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run concurrently
        #[must_use]
        pub fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }
    }
}

/// Dependency-injection traits for reducer environments.
///
/// All external dependencies are abstracted behind traits and injected via
/// the `Environment` associated type, so reducers stay deterministic under
/// test.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Abstracts time so reducers can be tested with a pinned clock.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Test clock that always returns a fixed instant.
    #[derive(Clone, Copy, Debug)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock pinned to `time`
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
}
