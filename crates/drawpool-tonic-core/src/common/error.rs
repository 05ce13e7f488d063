//! Error type for the minting service.
//!
//! Wraps [`drawpool::Error`] together with the failures that only exist at
//! the RPC boundary, and maps every case onto a `tonic::Status` code.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the minting service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The minter rejected the call.
    #[error(transparent)]
    Minter(#[from] drawpool::Error),

    /// The client request was malformed.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// An admin call without a valid admin token.
    #[error("Admin token missing or invalid")]
    Unauthorized,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        use drawpool::Error as E;

        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::Unauthorized => Status::permission_denied("admin token missing or invalid"),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
            Error::Minter(e) => {
                let message = e.to_string();
                match e {
                    E::InvalidSignature | E::SignatureAlreadyUsed => {
                        Status::permission_denied(message)
                    }
                    E::RequestNotFound(_) => Status::not_found(message),
                    E::RequestAlreadyFulfilled(_) | E::StaleDrawPlan { .. } => {
                        Status::failed_precondition(message)
                    }
                    E::PoolExhausted { .. }
                    | E::ExceedsPerCallCeiling { .. }
                    | E::ExceedsPoolCapacity { .. }
                    | E::ExceedsInFlightCeiling { .. } => Status::resource_exhausted(message),
                    E::ZeroAmount | E::EmptyRandomness(_) => Status::invalid_argument(message),
                    E::Paused | E::Oracle(_) | E::MinterStopped => Status::unavailable(message),
                    _ => Status::internal(message),
                }
            }
        }
    }
}
