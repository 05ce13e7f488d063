use ed25519_dalek::VerifyingKey;
use tokio::sync::oneshot;

use crate::{
    auth::AuthorizationMessage,
    error::Result,
    ledger::RandomnessRequest,
    types::{Identity, RequestId, TokenId},
};

/// Point-in-time counters of a running minter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MinterStats {
    pub capacity: u64,
    pub remaining: u64,
    pub minted: u64,
    pub requested: u64,
    pub per_call_ceiling: u64,
    pub in_flight_slack: u64,
    pub pending: usize,
    pub paused: bool,
}

/// A message processed by the minter task.
///
/// Every variant carries a oneshot `response` the task answers on. A dropped
/// receiver is ignored; the command still runs.
#[derive(Debug)]
pub enum Command {
    AuthorizationMessage {
        caller: Identity,
        amount: u64,
        salt: Option<[u8; 32]>,
        response: oneshot::Sender<AuthorizationMessage>,
    },
    RequestMint {
        caller: Identity,
        amount: u64,
        salt: Option<[u8; 32]>,
        signature: Vec<u8>,
        response: oneshot::Sender<Result<RequestId>>,
    },
    Fulfill {
        id: RequestId,
        random_words: Vec<u64>,
        response: oneshot::Sender<Result<Vec<TokenId>>>,
    },
    Request {
        id: RequestId,
        response: oneshot::Sender<Option<RandomnessRequest>>,
    },
    RequestIds {
        response: oneshot::Sender<Vec<RequestId>>,
    },
    Nonce {
        identity: Identity,
        response: oneshot::Sender<u64>,
    },
    Signer {
        response: oneshot::Sender<VerifyingKey>,
    },
    Stats {
        response: oneshot::Sender<Result<MinterStats>>,
    },
    RotateSigner {
        signer: VerifyingKey,
        response: oneshot::Sender<()>,
    },
    SetPaused {
        paused: bool,
        response: oneshot::Sender<()>,
    },
    SetQuotaLimits {
        per_call_ceiling: u64,
        in_flight_slack: u64,
        response: oneshot::Sender<()>,
    },
    ResetRequested {
        requested: u64,
        response: oneshot::Sender<()>,
    },
    /// Stops the task after acknowledging. Commands queued behind it are
    /// dropped.
    Shutdown { response: oneshot::Sender<()> },
}
