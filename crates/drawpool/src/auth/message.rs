use ed25519_dalek::{Signature, Signer, SigningKey};
use sha2::{Digest, Sha256};

use crate::types::{Domain, Identity};

/// Tag prefixed to every authorization digest.
pub const AUTHORIZATION_TAG: &[u8] = b"drawpool.mint.v1";

/// Length in bytes of an ed25519 authorization signature.
pub const SIGNATURE_LEN: usize = Signature::BYTE_SIZE;

/// The message an off-chain issuer signs to authorize one mint request.
///
/// The digest binds, in order: the caller, the amount, the caller's current
/// freshness nonce, the deployment and network of the [`Domain`], and (for the
/// issuance-style flow) a caller-chosen salt. Any change to any field yields
/// a different digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizationMessage {
    pub caller: Identity,
    pub amount: u64,
    pub nonce: u64,
    pub domain: Domain,
    pub salt: Option<[u8; 32]>,
}

impl AuthorizationMessage {
    /// SHA-256 digest of the canonical encoding.
    ///
    /// Integers are big-endian; fixed-width fields need no length prefixes.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(AUTHORIZATION_TAG);
        hasher.update(self.caller.as_bytes());
        hasher.update(self.amount.to_be_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.domain.deployment);
        hasher.update(self.domain.network_id.to_be_bytes());
        if let Some(salt) = &self.salt {
            hasher.update(salt);
        }
        hasher.finalize().into()
    }

    /// Signs the digest, as the off-chain issuer would.
    ///
    /// # Example
    /// ```
    /// use drawpool::{AuthorizationMessage, Domain, Identity};
    /// use drawpool::ed25519_dalek::SigningKey;
    ///
    /// let issuer = SigningKey::from_bytes(&[1; 32]);
    /// let message = AuthorizationMessage {
    ///     caller: Identity::from_bytes([2; 32]),
    ///     amount: 3,
    ///     nonce: 0,
    ///     domain: Domain::new([9; 32], 1),
    ///     salt: None,
    /// };
    /// let signature = message.sign(&issuer);
    /// assert_eq!(signature.len(), 64);
    /// ```
    pub fn sign(&self, key: &SigningKey) -> [u8; SIGNATURE_LEN] {
        key.sign(&self.digest()).to_bytes()
    }
}
