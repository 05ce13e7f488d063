use crate::{issuer::IssueError, oracle::OracleError, types::RequestId};

/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `drawpool` can produce.
///
/// Every variant is a terminal, synchronous rejection of the call that
/// triggered it. Nothing is retried internally, and a rejected call leaves the
/// minter exactly as it found it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The authorization was not signed by the currently trusted signer, or it
    /// was signed over a different message (stale nonce, other domain, ...).
    #[error("invalid signature")]
    InvalidSignature,

    /// The exact signature bytes were accepted before.
    #[error("signature already used")]
    SignatureAlreadyUsed,

    /// No randomness request with this id was ever opened.
    #[error("randomness request {0} not found")]
    RequestNotFound(RequestId),

    /// The request was already fulfilled; a second delivery is refused.
    #[error("randomness request {0} already fulfilled")]
    RequestAlreadyFulfilled(RequestId),

    /// The oracle handed out an id that is already in the ledger.
    #[error("oracle reused request id {0}")]
    DuplicateRequestId(RequestId),

    /// The pool holds fewer identifiers than the draw asked for.
    #[error("pool exhausted: requested {requested}, remaining {remaining}")]
    PoolExhausted { requested: u64, remaining: u64 },

    /// A draw plan was committed against a pool that moved on since it was
    /// planned.
    #[error("stale draw plan: planned at {planned} remaining, pool now at {remaining}")]
    StaleDrawPlan { planned: u64, remaining: u64 },

    /// The amount is above the per-call ceiling.
    #[error("amount {amount} exceeds per-call ceiling {ceiling}")]
    ExceedsPerCallCeiling { amount: u64, ceiling: u64 },

    /// Minted plus requested would go past the pool capacity.
    #[error("amount {amount} exceeds pool capacity ({minted} of {capacity} minted)")]
    ExceedsPoolCapacity {
        amount: u64,
        minted: u64,
        capacity: u64,
    },

    /// Total requested (including in-flight) would go past capacity + slack.
    #[error("amount {amount} exceeds in-flight ceiling ({requested} of {ceiling} requested)")]
    ExceedsInFlightCeiling {
        amount: u64,
        requested: u64,
        ceiling: u64,
    },

    /// A request for zero identifiers.
    #[error("amount must be greater than 0")]
    ZeroAmount,

    /// New requests are refused while the minter is paused.
    #[error("minter is paused")]
    Paused,

    /// The oracle delivered no random words.
    #[error("fulfillment for request {0} carried no random words")]
    EmptyRandomness(RequestId),

    /// The randomness oracle refused the outbound request.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The identifier ledger refused to issue an identifier.
    #[error(transparent)]
    Issue(#[from] IssueError),

    /// A shared pool lock was poisoned by a panicking holder.
    #[error("lock poisoned")]
    LockPoisoned,

    /// The task owning the minter has stopped.
    #[error("minter task stopped")]
    MinterStopped,
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}
