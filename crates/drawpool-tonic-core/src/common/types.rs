//! Wire conversions between the protobuf messages and `drawpool` types.
//!
//! Fixed-width fields (identities, salts, verifying keys, signatures) arrive
//! as raw bytes. Every parser here checks the length and reports
//! [`Error::InvalidRequest`] naming the offending field.

use drawpool::{
    AuthorizationMessage, Identity, MinterStats, RandomnessRequest, SIGNATURE_LEN,
    ed25519_dalek::VerifyingKey,
};

use crate::{
    Error, Result,
    proto::{GetAuthorizationResponse, PoolStatus, RequestInfo},
};

/// Name of the metadata entry carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn fixed<const N: usize>(field: &str, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::invalid(format!(
            "{field} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Parses a 32-byte identity.
pub fn parse_identity(field: &str, bytes: &[u8]) -> Result<Identity> {
    fixed::<32>(field, bytes).map(Identity::from_bytes)
}

/// Parses an optional 32-byte salt. An absent field means no salt.
pub fn parse_salt(bytes: Option<&[u8]>) -> Result<Option<[u8; 32]>> {
    bytes.map(|b| fixed::<32>("salt", b)).transpose()
}

/// Checks that a signature has the ed25519 length. Whether it verifies is up
/// to the minter.
pub fn parse_signature(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() != SIGNATURE_LEN {
        return Err(Error::invalid(format!(
            "signature must be {SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes.to_vec())
}

/// Parses a 32-byte compressed ed25519 verifying key.
pub fn parse_verifying_key(bytes: &[u8]) -> Result<VerifyingKey> {
    let raw = fixed::<32>("signer", bytes)?;
    VerifyingKey::from_bytes(&raw).map_err(|e| Error::invalid(format!("signer: {e}")))
}

impl From<&RandomnessRequest> for RequestInfo {
    fn from(request: &RandomnessRequest) -> Self {
        Self {
            request_id: request.id.0,
            fulfilled: request.is_fulfilled(),
            random_value: request.random_value,
            requester: request.requester.as_bytes().to_vec(),
            amount: request.amount,
        }
    }
}

impl From<MinterStats> for PoolStatus {
    fn from(stats: MinterStats) -> Self {
        Self {
            capacity: stats.capacity,
            remaining: stats.remaining,
            minted: stats.minted,
            requested: stats.requested,
            per_call_ceiling: stats.per_call_ceiling,
            in_flight_slack: stats.in_flight_slack,
            pending: stats.pending as u64,
            paused: stats.paused,
        }
    }
}

impl From<&AuthorizationMessage> for GetAuthorizationResponse {
    fn from(message: &AuthorizationMessage) -> Self {
        Self {
            digest: message.digest().to_vec(),
            nonce: message.nonce,
            deployment: message.domain.deployment.to_vec(),
            network_id: message.domain.network_id,
        }
    }
}
