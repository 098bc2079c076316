//! Store runtime for Doorlist reducers.
//!
//! The [`Store`] owns one aggregate instance's state behind a write lock and
//! is the serialization point for every mutation of that aggregate: the
//! reducer runs while the lock is held, so a check made by the reducer (for
//! example the registration ledger's capacity count) and the write it guards
//! are atomic with respect to concurrent dispatches. Effects returned by the
//! reducer execute *after* the lock is released, in spawned tasks, and any
//! actions they produce are broadcast to observers and fed back into the
//! reducer.
//!
//! Two dispatch entry points exist:
//!
//! - [`Store::send`] - fire the action, get an [`EffectHandle`] to await
//!   effect completion.
//! - [`Store::send_and_read`] - fire the action and map the post-reduction
//!   state to a value *under the same write lock*, for request/response
//!   callers that need the typed outcome of exactly this dispatch.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use doorlist_core::effect::Effect;
use doorlist_core::reducer::Reducer;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};

/// Errors surfaced by the store runtime.
///
/// Domain rejections never appear here: reducers record those in their own
/// state as typed outcomes. `StoreError` is reserved for infrastructure
/// conditions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store is shutting down and not accepting new actions
    #[error("store is shutting down")]
    ShutdownInProgress,

    /// Shutdown timed out waiting for effects to complete
    #[error("shutdown timed out with {0} effects still running")]
    ShutdownTimeout(usize),
}

/// Configuration for [`Store`] instances.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
        }
    }
}

/// Handle for tracking effect completion.
///
/// Returned by [`Store::send`]. Await [`EffectHandle::wait`] to know when
/// every effect spawned by that dispatch has finished.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (notifier, completion) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion,
        };
        let tracking = EffectTracking { counter, notifier };

        (handle, tracking)
    }

    /// Create a handle that is already complete.
    ///
    /// Useful as the initial value when accumulating the last handle of a
    /// loop of dispatches.
    #[must_use]
    pub fn completed() -> Self {
        let (notifier, completion) = watch::channel(());
        let _ = notifier.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion,
        }
    }

    /// Wait for all effects of the originating dispatch to complete.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            let _ = self.completion.changed().await;
        }
    }

    /// Wait for effect completion with a timeout.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal tracking context threaded through effect execution.
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

impl Clone for EffectTracking {
    fn clone(&self) -> Self {
        Self {
            counter: Arc::clone(&self.counter),
            notifier: self.notifier.clone(),
        }
    }
}

/// RAII guard that decrements the effect counter on drop.
///
/// Keeps the counter correct even when an effect task panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements the store-wide pending counter on drop.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The Store - runtime coordinator for one aggregate instance.
///
/// Manages:
/// 1. State (behind `RwLock` - writes serialize, reads run concurrently)
/// 2. Reducer (business logic)
/// 3. Environment (injected dependencies)
/// 4. Effect execution with a feedback loop
///
/// # Type parameters
///
/// - `S`: state, `A`: action, `E`: environment, `R`: reducer
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a store with the default configuration.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a store with a custom configuration.
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_broadcast,
        }
    }

    /// Send an action to the store.
    ///
    /// Acquires the state write lock, runs the reducer, releases the lock,
    /// then starts effect execution. Concurrent `send` calls serialize at
    /// the reducer. The returned [`EffectHandle`] resolves once the effects
    /// of this dispatch have completed - `send` itself returns earlier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting
    /// down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        let (handle, _) = self.dispatch(action, |_| ()).await?;
        Ok(handle)
    }

    /// Send an action and read a value off the post-reduction state.
    ///
    /// The closure runs while the write lock from this dispatch is still
    /// held, so the value it extracts reflects exactly this reduction - no
    /// interleaving dispatch can run in between. This is the
    /// request/response path: reducers record their typed outcome in state
    /// and callers collect it here.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting
    /// down.
    #[tracing::instrument(skip(self, action, read), name = "store_send_and_read")]
    pub async fn send_and_read<F, T>(&self, action: A, read: F) -> Result<T, StoreError>
    where
        F: FnOnce(&S) -> T,
    {
        let (_, value) = self.dispatch(action, read).await?;
        Ok(value)
    }

    /// Shared dispatch path for `send` and `send_and_read`.
    async fn dispatch<F, T>(&self, action: A, read: F) -> Result<(EffectHandle, T), StoreError>
    where
        F: FnOnce(&S) -> T,
    {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.actions.total").increment(1);
        let (handle, tracking) = EffectHandle::new();

        let (effects, value) = {
            let mut state = self.state.write().await;
            tracing::trace!("acquired write lock on state");

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            let value = read(&state);
            (effects, value)
        };

        tracing::trace!(effects = effects.len(), "executing effects");
        for effect in effects {
            self.execute_effect(effect, tracking.clone());
        }

        Ok((handle, value))
    }

    /// Read current state via a closure.
    ///
    /// Takes the read lock only for the duration of the closure; reads run
    /// concurrently with each other and see a consistent snapshot.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Subscribe to all actions produced by effects of this store.
    ///
    /// Intended for observers (dashboards, tests, event streaming). Initial
    /// actions passed to `send` are not broadcast; only actions that effects
    /// produce are.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Initiate graceful shutdown.
    ///
    /// Rejects new actions, then waits for pending effects to drain.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// when the timeout expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("initiating graceful shutdown");
        self.shutdown.store(true, Ordering::Release);

        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(50);

        loop {
            let pending = self.pending_effects.load(Ordering::Acquire);
            if pending == 0 {
                tracing::info!("all effects completed, shutdown successful");
                return Ok(());
            }
            if start.elapsed() >= timeout {
                tracing::error!(pending_effects = pending, "shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Execute one effect with completion tracking.
    ///
    /// Reducer panics propagate (fail fast); effect task panics are absorbed
    /// by the tracking guards so counters stay correct.
    fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Future(fut) => {
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                tracking.increment();
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let pending_guard = PendingGuard(Arc::clone(&self.pending_effects));

                let store = self.clone();
                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking);
                    let _pending_guard = pending_guard;

                    if let Some(action) = fut.await {
                        tracing::trace!("effect produced an action, feeding back");
                        let _ = store.action_broadcast.send(action.clone());
                        let _ = store.send(action).await;
                    }
                });
            },
            Effect::Delay { duration, action } => {
                metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                tracking.increment();
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let pending_guard = PendingGuard(Arc::clone(&self.pending_effects));

                let store = self.clone();
                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking);
                    let _pending_guard = pending_guard;

                    tokio::time::sleep(duration).await;
                    let _ = store.action_broadcast.send((*action).clone());
                    let _ = store.send(*action).await;
                });
            },
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.execute_effect(effect, tracking.clone());
                }
            },
            Effect::Sequential(effects) => {
                metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                tracking.increment();
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let pending_guard = PendingGuard(Arc::clone(&self.pending_effects));

                let store = self.clone();
                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking);
                    let _pending_guard = pending_guard;

                    for effect in effects {
                        let (mut sub_handle, sub_tracking) = EffectHandle::new();
                        store.execute_effect(effect, sub_tracking);
                        sub_handle.wait().await;
                    }
                });
            },
        }
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}
