use crate::{
    error::Result,
    pool::{DrawPlan, PoolState, UniquePool},
    types::TokenId,
};

/// A single-owner identifier pool.
///
/// The state is mutated only through `&mut self`, so the borrow checker
/// guarantees one draw runs to completion before the next one starts.
///
/// ## Features
/// - ❌ Not shareable across threads without external synchronization
/// - ✅ No locking overhead
///
/// ## Recommended When
/// - The pool is owned by a single minter or actor task
///
/// ## See Also
/// - [`LockPool`]
///
/// [`LockPool`]: crate::LockPool
#[derive(Clone, Debug)]
pub struct BasicPool {
    state: PoolState,
}

impl BasicPool {
    /// Creates a fresh pool holding identifiers `1..=capacity`.
    ///
    /// # Example
    /// ```
    /// use drawpool::{BasicPool, TokenId, UniquePool};
    ///
    /// let mut pool = BasicPool::new(5);
    /// let ids = pool.try_draw(7, 2).unwrap();
    /// assert_eq!(ids, vec![TokenId(3), TokenId(4)]);
    /// assert_eq!(pool.try_remaining().unwrap(), 3);
    /// ```
    pub fn new(capacity: u64) -> Self {
        Self::from_state(PoolState::new(capacity))
    }

    /// Wraps an existing state, e.g. a [`LockPool::snapshot`](crate::LockPool::snapshot).
    pub const fn from_state(state: PoolState) -> Self {
        Self { state }
    }

    pub const fn state(&self) -> &PoolState {
        &self.state
    }
}

impl UniquePool for BasicPool {
    fn capacity(&self) -> u64 {
        self.state.capacity()
    }

    fn try_remaining(&self) -> Result<u64> {
        Ok(self.state.remaining())
    }

    fn try_plan(&self, seed: u64, count: u64) -> Result<DrawPlan> {
        self.state.plan(seed, count)
    }

    fn try_commit(&mut self, plan: DrawPlan) -> Result<Vec<TokenId>> {
        self.state.commit(plan)
    }
}
