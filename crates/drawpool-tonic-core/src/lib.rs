#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Re-exported so downstream crates reach the core library as
// `drawpool_tonic_core::drawpool`.
pub use drawpool;

/// Messages and service bindings generated from `proto/drawpool.proto`.
///
/// Identities, salts and verifying keys travel as raw 32-byte fields and
/// signatures as raw 64-byte fields. Helpers in [`types`](crate::types) convert them into
/// `drawpool` types and reject anything of the wrong length.
pub mod proto {
    tonic::include_proto!("drawpool");

    /// Encoded file descriptor set, for gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("drawpool_descriptor");
}
