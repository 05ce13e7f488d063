//! gRPC service implementation.
//!
//! - [`handler`] - gRPC service entry point (`MintService`).

pub mod handler;
