use tokio::sync::mpsc;

use crate::{
    oracle::{OracleError, OracleParams, RandomnessOracle},
    types::RequestId,
};

/// A randomness request on its way to whoever produces the randomness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleRequest {
    pub id: RequestId,
    pub params: OracleParams,
}

/// Oracle that issues sequential ids and forwards each request over a channel.
///
/// The receiving side answers by calling
/// [`MinterHandle::fulfill`](crate::MinterHandle::fulfill) with the id. The
/// channel is unbounded so that placing a request never blocks the minter
/// task.
#[derive(Debug)]
pub struct ChannelOracle {
    next_id: u64,
    tx: mpsc::UnboundedSender<OracleRequest>,
}

impl ChannelOracle {
    /// Creates an oracle whose ids start at 1.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OracleRequest>) {
        Self::starting_at(1)
    }

    /// Ids count up from `first_id`. `u64::MAX` is never handed out; once it
    /// is reached every request fails.
    pub fn starting_at(first_id: u64) -> (Self, mpsc::UnboundedReceiver<OracleRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                next_id: first_id,
                tx,
            },
            rx,
        )
    }
}

impl RandomnessOracle for ChannelOracle {
    fn request_randomness(&mut self, params: &OracleParams) -> Result<RequestId, OracleError> {
        let id = RequestId(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| OracleError::new("request ids exhausted"))?;
        self.tx
            .send(OracleRequest {
                id,
                params: *params,
            })
            .map_err(|_| OracleError::new("oracle receiver dropped"))?;
        self.next_id = next_id;
        Ok(id)
    }
}
