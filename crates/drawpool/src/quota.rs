use crate::error::{Error, Result};

/// Ceilings enforced by the [`QuotaGovernor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuotaLimits {
    /// Size of the pool. Nothing past it is ever minted.
    pub capacity: u64,
    /// Largest amount a single request may ask for.
    pub per_call_ceiling: u64,
    /// How far total requests may run past `capacity` to absorb in-flight
    /// requests that will later fail at fulfillment.
    pub in_flight_slack: u64,
}

impl QuotaLimits {
    /// `capacity + in_flight_slack`, saturating.
    pub const fn in_flight_ceiling(&self) -> u64 {
        self.capacity.saturating_add(self.in_flight_slack)
    }
}

/// Admission control for mint requests.
///
/// Tracks two counters: `requested`, every amount ever admitted (including
/// requests still waiting on the oracle), and `minted`, every identifier
/// actually issued. Checks run in a fixed order and are pure; only
/// [`Self::reserve`] moves `requested`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaGovernor {
    limits: QuotaLimits,
    requested: u64,
    minted: u64,
}

impl QuotaGovernor {
    pub const fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            requested: 0,
            minted: 0,
        }
    }

    pub const fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    pub const fn requested(&self) -> u64 {
        self.requested
    }

    pub const fn minted(&self) -> u64 {
        self.minted
    }

    /// Checks whether `amount` may be admitted, without reserving it.
    ///
    /// # Errors
    ///
    /// In check order:
    /// - [`Error::ZeroAmount`]
    /// - [`Error::ExceedsPerCallCeiling`]
    /// - [`Error::ExceedsInFlightCeiling`]
    /// - [`Error::ExceedsPoolCapacity`]
    pub fn check(&self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        if amount > self.limits.per_call_ceiling {
            return Err(Error::ExceedsPerCallCeiling {
                amount,
                ceiling: self.limits.per_call_ceiling,
            });
        }
        let ceiling = self.limits.in_flight_ceiling();
        match self.requested.checked_add(amount) {
            Some(total) if total <= ceiling => {}
            _ => {
                return Err(Error::ExceedsInFlightCeiling {
                    amount,
                    requested: self.requested,
                    ceiling,
                });
            }
        }
        match self.minted.checked_add(amount) {
            Some(total) if total <= self.limits.capacity => Ok(()),
            _ => Err(Error::ExceedsPoolCapacity {
                amount,
                minted: self.minted,
                capacity: self.limits.capacity,
            }),
        }
    }

    /// Reserves capacity for an amount that already passed [`Self::check`].
    pub const fn reserve(&mut self, amount: u64) {
        self.requested = self.requested.saturating_add(amount);
    }

    /// Returns a reservation whose request was never opened.
    pub fn release(&mut self, amount: u64) {
        self.requested = self.requested.saturating_sub(amount).max(self.minted);
    }

    /// Checks and reserves in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::check`]. Nothing is reserved on failure.
    pub fn admit(&mut self, amount: u64) -> Result<()> {
        self.check(amount)?;
        self.reserve(amount);
        Ok(())
    }

    /// Records identifiers that were actually issued.
    pub const fn record_minted(&mut self, count: u64) {
        self.minted = self.minted.saturating_add(count);
    }

    /// Adjusts the per-call ceiling and slack. Capacity is fixed by the pool
    /// and is kept as is.
    pub fn set_limits(&mut self, per_call_ceiling: u64, in_flight_slack: u64) {
        #[cfg(feature = "tracing")]
        tracing::info!(per_call_ceiling, in_flight_slack, "updating quota limits");
        self.limits.per_call_ceiling = per_call_ceiling;
        self.limits.in_flight_slack = in_flight_slack;
    }

    /// Releases reservations held by requests that will never be fulfilled.
    ///
    /// `requested` never drops below `minted`.
    pub fn reset_requested(&mut self, requested: u64) {
        #[cfg(feature = "tracing")]
        tracing::warn!(from = self.requested, to = requested, "resetting requested quota");
        self.requested = requested.max(self.minted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor() -> QuotaGovernor {
        QuotaGovernor::new(QuotaLimits {
            capacity: 10,
            per_call_ceiling: 4,
            in_flight_slack: 3,
        })
    }

    #[test]
    fn admits_within_limits() {
        let mut quota = governor();
        quota.admit(4).unwrap();
        quota.admit(4).unwrap();
        assert_eq!(quota.requested(), 8);
        assert_eq!(quota.minted(), 0);
    }

    #[test]
    fn rejects_zero_amount() {
        assert_eq!(governor().check(0), Err(Error::ZeroAmount));
    }

    #[test]
    fn rejects_above_per_call_ceiling() {
        let mut quota = governor();
        assert_eq!(
            quota.admit(5),
            Err(Error::ExceedsPerCallCeiling {
                amount: 5,
                ceiling: 4
            })
        );
        assert_eq!(quota.requested(), 0);
    }

    #[test]
    fn slack_absorbs_in_flight_requests_up_to_the_ceiling() {
        let mut quota = governor();
        for _ in 0..3 {
            quota.admit(4).unwrap();
        }
        // 12 requested, ceiling is 13
        quota.admit(1).unwrap();
        assert_eq!(
            quota.admit(1),
            Err(Error::ExceedsInFlightCeiling {
                amount: 1,
                requested: 13,
                ceiling: 13
            })
        );
        assert_eq!(quota.requested(), 13);
    }

    #[test]
    fn rejects_once_minted_would_pass_capacity() {
        let mut quota = governor();
        quota.admit(4).unwrap();
        quota.admit(4).unwrap();
        quota.record_minted(8);
        quota.reset_requested(8);

        assert_eq!(
            quota.check(3),
            Err(Error::ExceedsPoolCapacity {
                amount: 3,
                minted: 8,
                capacity: 10
            })
        );
        quota.check(2).unwrap();
    }

    #[test]
    fn check_order_prefers_per_call_over_capacity() {
        let mut quota = governor();
        quota.record_minted(10);
        assert!(matches!(
            quota.check(5),
            Err(Error::ExceedsPerCallCeiling { .. })
        ));
    }

    #[test]
    fn release_returns_an_unopened_reservation() {
        let mut quota = governor();
        quota.admit(4).unwrap();
        quota.record_minted(2);
        quota.admit(3).unwrap();
        quota.release(3);
        assert_eq!(quota.requested(), 4);
        quota.release(10);
        assert_eq!(quota.requested(), 2);
    }

    #[test]
    fn reset_never_drops_below_minted() {
        let mut quota = governor();
        quota.admit(4).unwrap();
        quota.record_minted(3);
        quota.reset_requested(0);
        assert_eq!(quota.requested(), 3);
    }

    #[test]
    fn set_limits_keeps_capacity() {
        let mut quota = governor();
        quota.set_limits(1, 0);
        assert_eq!(quota.limits().capacity, 10);
        assert_eq!(quota.limits().in_flight_ceiling(), 10);
        assert!(matches!(
            quota.check(2),
            Err(Error::ExceedsPerCallCeiling { .. })
        ));
    }
}
