use crate::types::{Identity, RequestId};

/// What the minter asks the oracle for on each accepted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleParams {
    pub requester: Identity,
    pub amount: u64,
    /// Number of random words wanted. The draw consumes the first one.
    pub num_words: u32,
}

/// The oracle refused or failed to accept a request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("oracle request failed: {reason}")]
pub struct OracleError {
    pub reason: String,
}

impl OracleError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outbound half of the randomness oracle.
///
/// The oracle answers later, out of band, by having someone call
/// [`Minter::fulfill`] with the returned id. Implementations must hand out
/// ids that are unique for the lifetime of the minter, and must deliver each
/// fulfillment at most once.
///
/// [`Minter::fulfill`]: crate::Minter::fulfill
pub trait RandomnessOracle {
    /// Forwards a randomness request and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] if the request could not be placed. The
    /// minter then rejects the mint request without mutating any state.
    fn request_randomness(&mut self, params: &OracleParams) -> Result<RequestId, OracleError>;
}

impl<O: RandomnessOracle + ?Sized> RandomnessOracle for Box<O> {
    fn request_randomness(&mut self, params: &OracleParams) -> Result<RequestId, OracleError> {
        (**self).request_randomness(params)
    }
}

/// An in-process oracle that issues sequential ids and records every request.
///
/// Useful for tests and simulations where fulfillments are delivered by hand.
///
/// # Example
/// ```
/// use drawpool::{Identity, OracleParams, RandomnessOracle, RequestId, ScriptedOracle};
///
/// let mut oracle = ScriptedOracle::starting_at(100);
/// let params = OracleParams { requester: Identity::default(), amount: 1, num_words: 1 };
/// assert_eq!(oracle.request_randomness(&params).unwrap(), RequestId(100));
/// assert_eq!(oracle.requests().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScriptedOracle {
    next_id: u64,
    requests: Vec<(RequestId, OracleParams)>,
    fail_next: Option<String>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids count up from `first_id`. `u64::MAX` is never handed out; once it
    /// is reached every request fails.
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: first_id,
            ..Self::default()
        }
    }

    /// Every request placed so far, in order.
    pub fn requests(&self) -> &[(RequestId, OracleParams)] {
        &self.requests
    }

    /// Makes the next request fail with `reason`.
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }
}

impl RandomnessOracle for ScriptedOracle {
    fn request_randomness(&mut self, params: &OracleParams) -> Result<RequestId, OracleError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(OracleError::new(reason));
        }
        let id = RequestId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| OracleError::new("request ids exhausted"))?;
        self.requests.push((id, *params));
        Ok(id)
    }
}
