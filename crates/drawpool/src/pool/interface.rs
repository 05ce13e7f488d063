use crate::{
    error::Result,
    pool::DrawPlan,
    types::TokenId,
};

/// A minimal interface over a draw-without-replacement identifier pool.
pub trait UniquePool {
    /// Total number of identifiers the pool started with.
    fn capacity(&self) -> u64;

    /// Number of identifiers not yet drawn.
    ///
    /// # Errors
    ///
    /// May return an error if the underlying implementation uses a lock and it
    /// is poisoned.
    fn try_remaining(&self) -> Result<u64>;

    /// Computes a draw without applying it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if `count` exceeds the remaining
    /// identifiers, or a lock error.
    ///
    /// [`Error::PoolExhausted`]: crate::Error::PoolExhausted
    fn try_plan(&self, seed: u64, count: u64) -> Result<DrawPlan>;

    /// Applies a plan computed by [`Self::try_plan`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleDrawPlan`] if the pool moved since planning, or a
    /// lock error.
    ///
    /// [`Error::StaleDrawPlan`]: crate::Error::StaleDrawPlan
    fn try_commit(&mut self, plan: DrawPlan) -> Result<Vec<TokenId>>;

    /// Draws `count` unique identifiers seeded by `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if `count` exceeds the remaining
    /// identifiers, or a lock error.
    ///
    /// [`Error::PoolExhausted`]: crate::Error::PoolExhausted
    fn try_draw(&mut self, seed: u64, count: u64) -> Result<Vec<TokenId>> {
        let plan = self.try_plan(seed, count)?;
        self.try_commit(plan)
    }
}
