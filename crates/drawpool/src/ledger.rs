use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    types::{Identity, RequestId},
};

/// Lifecycle of a randomness request. `Fulfilled` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestState {
    Pending,
    Fulfilled,
}

/// One oracle round-trip, from acceptance to fulfillment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomnessRequest {
    pub id: RequestId,
    pub state: RequestState,
    pub requester: Identity,
    pub amount: u64,
    /// Present once the request is fulfilled.
    pub random_value: Option<u64>,
    /// The consumed authorization, kept for audit. Never re-validated.
    pub authorization: Vec<u8>,
}

impl RandomnessRequest {
    pub fn is_fulfilled(&self) -> bool {
        self.state == RequestState::Fulfilled
    }
}

/// Append-only record of every randomness request and every requester's
/// freshness nonce.
///
/// Entries are never deleted. A requester's nonce moves by exactly one per
/// fulfilled request, whatever the amount.
#[derive(Clone, Debug, Default)]
pub struct RequestLedger {
    requests: HashMap<RequestId, RandomnessRequest>,
    request_ids: Vec<RequestId>,
    nonces: HashMap<Identity, u64>,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry with this id exists.
    pub fn contains(&self, id: RequestId) -> bool {
        self.requests.contains_key(&id)
    }

    /// Records a newly accepted request in state `Pending`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRequestId`] if the oracle reused an id.
    pub fn open(
        &mut self,
        id: RequestId,
        requester: Identity,
        amount: u64,
        authorization: Vec<u8>,
    ) -> Result<()> {
        if self.contains(id) {
            return Err(Error::DuplicateRequestId(id));
        }
        self.requests.insert(
            id,
            RandomnessRequest {
                id,
                state: RequestState::Pending,
                requester,
                amount,
                random_value: None,
                authorization,
            },
        );
        self.request_ids.push(id);
        Ok(())
    }

    /// Looks up a request that is waiting for its fulfillment.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestNotFound`] if no such request was opened.
    /// - [`Error::RequestAlreadyFulfilled`] on a duplicate delivery.
    pub fn pending(&self, id: RequestId) -> Result<&RandomnessRequest> {
        let request = self.requests.get(&id).ok_or(Error::RequestNotFound(id))?;
        if request.is_fulfilled() {
            return Err(Error::RequestAlreadyFulfilled(id));
        }
        Ok(request)
    }

    /// Moves a pending request to `Fulfilled`, records its random value and
    /// advances the requester's nonce by one.
    ///
    /// # Errors
    ///
    /// Same as [`Self::pending`].
    pub fn complete(&mut self, id: RequestId, random_value: u64) -> Result<&RandomnessRequest> {
        self.pending(id)?;
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(Error::RequestNotFound(id))?;
        request.state = RequestState::Fulfilled;
        request.random_value = Some(random_value);
        *self.nonces.entry(request.requester).or_default() += 1;
        Ok(request)
    }

    pub fn get(&self, id: RequestId) -> Option<&RandomnessRequest> {
        self.requests.get(&id)
    }

    /// `(fulfilled, random_value)` for a request, if it exists.
    pub fn status(&self, id: RequestId) -> Option<(bool, Option<u64>)> {
        self.get(id).map(|r| (r.is_fulfilled(), r.random_value))
    }

    /// Every request id ever opened, in opening order.
    pub fn request_ids(&self) -> &[RequestId] {
        &self.request_ids
    }

    /// The current freshness nonce of `identity`. Starts at 0.
    pub fn nonce(&self, identity: &Identity) -> u64 {
        self.nonces.get(identity).copied().unwrap_or_default()
    }

    pub fn pending_count(&self) -> usize {
        self.requests.values().filter(|r| !r.is_fulfilled()).count()
    }
}
