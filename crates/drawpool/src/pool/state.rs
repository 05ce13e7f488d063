use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    types::TokenId,
};

/// The shrinking pool behind every [`UniquePool`].
///
/// Conceptually the pool is an array `slots[0..capacity]` holding a permutation
/// of `0..capacity`, of which only the prefix `[0, remaining)` is still live.
/// The array is never materialized: `overrides` stores only the slots whose
/// content differs from their own position, so an absent key reads as the
/// position itself.
///
/// Absence is tracked by map presence, never by a reserved value, so a slot
/// that legitimately holds `0` is not confused with an untouched one.
///
/// [`UniquePool`]: crate::UniquePool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    capacity: u64,
    remaining: u64,
    overrides: HashMap<u64, u64>,
}

/// A computed but not yet applied draw.
///
/// Produced by [`PoolState::plan`] and applied with [`PoolState::commit`].
/// Planning is pure, which lets a caller hand the identifiers to an external
/// ledger first and only commit once every issue succeeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawPlan {
    ids: Vec<TokenId>,
    /// Slot writes, ascending by position.
    writes: Vec<(u64, u64)>,
    base_remaining: u64,
    remaining: u64,
}

impl DrawPlan {
    /// The identifiers this draw emits, in draw order.
    pub fn ids(&self) -> &[TokenId] {
        &self.ids
    }

    /// The pool's `remaining` once the plan is committed.
    pub const fn remaining_after(&self) -> u64 {
        self.remaining
    }
}

impl PoolState {
    /// Creates a fresh pool of `capacity` identifiers, `1..=capacity`.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            remaining: capacity,
            overrides: HashMap::new(),
        }
    }

    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Number of identifiers drawn so far.
    pub const fn drawn(&self) -> u64 {
        self.capacity - self.remaining
    }

    /// The explicitly stored content of `position`, if any.
    pub fn override_at(&self, position: u64) -> Option<u64> {
        self.overrides.get(&position).copied()
    }

    /// Number of stored overrides. Only live slots are ever kept.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    fn read(&self, staged: &BTreeMap<u64, u64>, position: u64) -> u64 {
        staged
            .get(&position)
            .or_else(|| self.overrides.get(&position))
            .copied()
            .unwrap_or(position)
    }

    /// Computes a draw of `count` identifiers seeded by `seed`.
    ///
    /// Runs an inside-out partial Fisher-Yates over the live prefix:
    ///
    /// 1. `index = seed % remaining`
    /// 2. emit `slots[index] + 1`
    /// 3. `slots[index] = slots[remaining - 1]`
    /// 4. `remaining -= 1`
    ///
    /// The seed is reused unchanged on every iteration; only `remaining`
    /// moves. A draw touches `O(count)` map entries regardless of capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if `count > remaining`.
    ///
    /// # Example
    /// ```
    /// use drawpool::{PoolState, TokenId};
    ///
    /// let pool = PoolState::new(5);
    /// let plan = pool.plan(7, 2).unwrap();
    /// assert_eq!(plan.ids(), &[TokenId(3), TokenId(4)]);
    /// assert_eq!(plan.remaining_after(), 3);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn plan(&self, seed: u64, count: u64) -> Result<DrawPlan> {
        if count > self.remaining {
            return Err(Error::PoolExhausted {
                requested: count,
                remaining: self.remaining,
            });
        }

        let len = usize::try_from(count).unwrap_or(0);
        let mut staged = BTreeMap::new();
        let mut ids = Vec::with_capacity(len);
        let mut remaining = self.remaining;

        for _ in 0..count {
            let index = seed % remaining;
            let value = self.read(&staged, index);
            ids.push(TokenId(value + 1));

            let tail = remaining - 1;
            let tail_value = self.read(&staged, tail);
            staged.insert(index, tail_value);
            remaining = tail;
        }

        Ok(DrawPlan {
            ids,
            writes: staged.into_iter().collect(),
            base_remaining: self.remaining,
            remaining,
        })
    }

    /// Applies a plan produced by [`Self::plan`] on this exact state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleDrawPlan`] if another draw was committed after
    /// the plan was computed.
    pub fn commit(&mut self, plan: DrawPlan) -> Result<Vec<TokenId>> {
        if plan.base_remaining != self.remaining {
            return Err(Error::StaleDrawPlan {
                planned: plan.base_remaining,
                remaining: self.remaining,
            });
        }
        for (position, value) in plan.writes {
            if position == value {
                self.overrides.remove(&position);
            } else {
                self.overrides.insert(position, value);
            }
        }
        // Slots at or past the new tail are inert; keep the map sparse.
        for position in plan.remaining..plan.base_remaining {
            self.overrides.remove(&position);
        }
        self.remaining = plan.remaining;
        Ok(plan.ids)
    }

    /// Plans and commits in one step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if `count > remaining`.
    pub fn draw(&mut self, seed: u64, count: u64) -> Result<Vec<TokenId>> {
        let plan = self.plan(seed, count)?;
        self.commit(plan)
    }
}
