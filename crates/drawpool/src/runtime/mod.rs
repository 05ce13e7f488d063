//! Async runtime for a [`Minter`](crate::Minter).
//!
//! A minter is owned by a single task that processes [`Command`]s one at a
//! time, so request and fulfillment calls coming from many tasks are
//! serialized without any lock around the minter itself. Callers talk to the
//! task through a cloneable [`MinterHandle`].
//!
//! [`ChannelOracle`] is the matching outbound oracle: it hands out sequential
//! ids and forwards every request to whoever drives the fulfillments.

mod command;
mod handle;
mod oracle;
mod worker;


pub use command::*;
pub use handle::*;
pub use oracle::*;
pub use worker::*;
