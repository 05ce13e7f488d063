use anyhow::{Context, bail};
use clap::Parser;
use drawpool_tonic_core::drawpool::{
    Domain, MinterConfig, decode_hex32, ed25519_dalek::VerifyingKey,
};

/// Runtime configuration for the `drawpool-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. The
/// trusted signer has no default: a server that cannot verify
/// authorizations refuses to start.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "drawpool-tonic-server",
    version,
    about = "A gRPC service minting unique identifiers from an oracle-seeded pool"
)]
pub struct CliArgs {
    /// Number of identifiers in the pool. Identifiers are `1..=POOL_CAPACITY`.
    ///
    /// Environment variable: `POOL_CAPACITY`
    #[arg(long, env = "POOL_CAPACITY", default_value_t = 10_000)]
    pub pool_capacity: u64,

    /// Largest amount a single mint request may ask for.
    ///
    /// Environment variable: `MAX_PER_CALL`
    #[arg(long, env = "MAX_PER_CALL", default_value_t = 20)]
    pub max_per_call: u64,

    /// How far admitted requests may run past the pool capacity while they
    /// wait for the oracle.
    ///
    /// Environment variable: `IN_FLIGHT_SLACK`
    #[arg(long, env = "IN_FLIGHT_SLACK", default_value_t = 0)]
    pub in_flight_slack: u64,

    /// Hex-encoded 32-byte ed25519 verifying key of the authorization
    /// signer.
    ///
    /// Environment variable: `TRUSTED_SIGNER`
    #[arg(long, env = "TRUSTED_SIGNER")]
    pub trusted_signer: String,

    /// Hex-encoded 32-byte deployment identifier bound into every
    /// authorization.
    ///
    /// Environment variable: `DEPLOYMENT_ID`
    #[arg(long, env = "DEPLOYMENT_ID", default_value_t = String::from("00".repeat(32)))]
    pub deployment_id: String,

    /// Network identifier bound into every authorization.
    ///
    /// Environment variable: `NETWORK_ID`
    #[arg(long, env = "NETWORK_ID", default_value_t = 1)]
    pub network_id: u64,

    /// Capacity of the command queue in front of the minter task.
    ///
    /// Environment variable: `COMMAND_BUFFER_SIZE`
    #[arg(long, env = "COMMAND_BUFFER_SIZE", default_value_t = 64)]
    pub command_buffer_size: usize,

    /// Fulfill randomness requests in-process instead of waiting for an
    /// external oracle to call `Fulfill`.
    ///
    /// Environment variable: `ORACLE_ENABLED`
    #[arg(long, env = "ORACLE_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub oracle_enabled: bool,

    /// Delay before the in-process oracle answers a request, in
    /// milliseconds.
    ///
    /// Environment variable: `ORACLE_DELAY_MS`
    #[arg(long, env = "ORACLE_DELAY_MS", default_value_t = 0)]
    pub oracle_delay_ms: u64,

    /// Token required in the `x-admin-token` metadata of admin calls. Admin
    /// calls are refused when unset.
    ///
    /// Environment variable: `ADMIN_TOKEN`
    #[arg(long, env = "ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// Seconds to wait for the minter task to acknowledge shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix
    /// socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/drawpool.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be
    /// a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub minter: MinterConfig,
    pub command_buffer_size: usize,
    pub oracle_enabled: bool,
    pub oracle_delay_ms: u64,
    pub admin_token: Option<String>,
    pub shutdown_timeout: u64,
    pub server_addr: String,
    pub uds: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.pool_capacity == 0 {
            bail!("POOL_CAPACITY must be greater than 0");
        }

        if args.max_per_call == 0 {
            bail!("MAX_PER_CALL must be greater than 0");
        }

        if args.max_per_call > args.pool_capacity {
            bail!(
                "MAX_PER_CALL ({}) exceeds POOL_CAPACITY ({})",
                args.max_per_call,
                args.pool_capacity
            );
        }

        if args.command_buffer_size == 0 {
            bail!("COMMAND_BUFFER_SIZE must be greater than 0");
        }

        let signer = decode_hex32(&args.trusted_signer).context("invalid TRUSTED_SIGNER")?;
        let signer = VerifyingKey::from_bytes(&signer)
            .context("TRUSTED_SIGNER is not a valid ed25519 key")?;
        let deployment = decode_hex32(&args.deployment_id).context("invalid DEPLOYMENT_ID")?;

        let admin_token = args.admin_token.filter(|token| !token.is_empty());

        Ok(Self {
            minter: MinterConfig {
                capacity: args.pool_capacity,
                per_call_ceiling: args.max_per_call,
                in_flight_slack: args.in_flight_slack,
                domain: Domain::new(deployment, args.network_id),
                signer,
            },
            command_buffer_size: args.command_buffer_size,
            oracle_enabled: args.oracle_enabled,
            oracle_delay_ms: args.oracle_delay_ms,
            admin_token,
            shutdown_timeout: args.shutdown_timeout,
            server_addr: args.server_addr,
            uds: args.uds,
        })
    }
}
