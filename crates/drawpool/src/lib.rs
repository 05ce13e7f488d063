#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod auth;
mod error;
mod issuer;
mod ledger;
mod minter;
mod oracle;
mod pool;
mod quota;
#[cfg(feature = "async-tokio")]
mod runtime;
mod types;

pub use crate::auth::*;
pub use crate::error::*;
pub use crate::issuer::*;
pub use crate::ledger::*;
pub use crate::minter::*;
pub use crate::oracle::*;
pub use crate::pool::*;
pub use crate::quota::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use crate::runtime::*;
pub use crate::types::*;

// Re-exported so callers can build signers and verifying keys without pinning
// their own `ed25519-dalek` version.
pub use ed25519_dalek;
