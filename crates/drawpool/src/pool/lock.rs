use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::Result,
    pool::{DrawPlan, Mutex, MutexGuard, PoolState, UniquePool},
    types::TokenId,
};

/// A lock-based identifier pool that can be shared across threads.
///
/// Cloning a [`LockPool`] yields another handle to the same pool. Every draw
/// holds the lock from the first read to the last write, so concurrent draws
/// serialize and never observe each other's intermediate state.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Cheap read handles for monitoring while a minter owns the writes
///
/// ## Recommended When
/// - The pool must be observed (or drawn from) by more than one task
///
/// ## See Also
/// - [`BasicPool`]
///
/// [`BasicPool`]: crate::BasicPool
#[derive(Clone, Debug)]
pub struct LockPool {
    state: Arc<Mutex<PoolState>>,
    capacity: u64,
}

impl LockPool {
    /// Creates a fresh shared pool holding identifiers `1..=capacity`.
    pub fn new(capacity: u64) -> Self {
        Self::from_state(PoolState::new(capacity))
    }

    /// Wraps an existing state, e.g. a [`Self::snapshot`] of another pool.
    pub fn from_state(state: PoolState) -> Self {
        let capacity = state.capacity();
        Self {
            state: Arc::new(Mutex::new(state)),
            capacity,
        }
    }

    #[cfg(not(feature = "parking-lot"))]
    fn lock(&self) -> Result<MutexGuard<'_, PoolState>> {
        Ok(self.state.lock()?)
    }

    #[cfg(feature = "parking-lot")]
    #[allow(clippy::unnecessary_wraps)]
    fn lock(&self) -> Result<MutexGuard<'_, PoolState>> {
        Ok(self.state.lock())
    }

    /// Returns a copy of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a previous holder panicked.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn snapshot(&self) -> Result<PoolState> {
        Ok(self.lock()?.clone())
    }
}

impl UniquePool for LockPool {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn try_remaining(&self) -> Result<u64> {
        Ok(self.lock()?.remaining())
    }

    fn try_plan(&self, seed: u64, count: u64) -> Result<DrawPlan> {
        self.lock()?.plan(seed, count)
    }

    fn try_commit(&mut self, plan: DrawPlan) -> Result<Vec<TokenId>> {
        self.lock()?.commit(plan)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn try_draw(&mut self, seed: u64, count: u64) -> Result<Vec<TokenId>> {
        self.lock()?.draw(seed, count)
    }
}
