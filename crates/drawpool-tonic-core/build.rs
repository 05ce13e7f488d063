//! Generates the gRPC client and server code for `proto/drawpool.proto`.
//!
//! The file descriptor set is written next to the generated code so the
//! server can expose it through gRPC reflection. Signatures are kept as
//! `Bytes` to avoid a copy on decode.
//!
//! # Panics
//!
//! Panics if code generation fails.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("drawpool_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config
        .bytes([".drawpool.RequestMintRequest.signature"])
        .file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/drawpool.proto"], &["proto"])
        .unwrap();
}
