use std::collections::HashSet;

use ed25519_dalek::{Signature, VerifyingKey};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    auth::{AuthorizationMessage, SIGNATURE_LEN},
    error::{Error, Result},
};

/// Verifies signed authorizations and refuses to accept one twice.
///
/// Only the currently trusted signer is consulted. Rotating it with
/// [`Self::rotate_signer`] is not retroactive: authorizations already consumed
/// stay consumed, and unsubmitted ones signed by the old key stop verifying.
#[derive(Clone, Debug)]
pub struct ReplayGuard {
    signer: VerifyingKey,
    consumed: HashSet<[u8; SIGNATURE_LEN]>,
}

impl ReplayGuard {
    pub fn new(signer: VerifyingKey) -> Self {
        Self {
            signer,
            consumed: HashSet::new(),
        }
    }

    /// The currently trusted signer.
    pub const fn signer(&self) -> &VerifyingKey {
        &self.signer
    }

    /// Replaces the trusted signer for every later call.
    pub fn rotate_signer(&mut self, signer: VerifyingKey) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            old = %hex::encode(self.signer.as_bytes()),
            new = %hex::encode(signer.as_bytes()),
            "rotating trusted signer"
        );
        self.signer = signer;
    }

    /// Whether these exact signature bytes were accepted before.
    pub fn is_consumed(&self, signature: &[u8]) -> bool {
        <[u8; SIGNATURE_LEN]>::try_from(signature).is_ok_and(|sig| self.consumed.contains(&sig))
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Checks `signature` over `message` without consuming it.
    ///
    /// # Errors
    ///
    /// - [`Error::SignatureAlreadyUsed`] if the bytes were consumed before.
    /// - [`Error::InvalidSignature`] if the bytes are malformed or were not
    ///   produced by the trusted signer over this exact message.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(caller = %message.caller)))]
    pub fn verify(
        &self,
        message: &AuthorizationMessage,
        signature: &[u8],
    ) -> Result<[u8; SIGNATURE_LEN]> {
        let bytes: [u8; SIGNATURE_LEN] = signature
            .try_into()
            .map_err(|_| Error::InvalidSignature)?;

        if self.consumed.contains(&bytes) {
            return Err(Error::SignatureAlreadyUsed);
        }

        let sig = Signature::from_bytes(&bytes);
        self.signer
            .verify_strict(&message.digest(), &sig)
            .map_err(|_| Error::InvalidSignature)?;

        Ok(bytes)
    }

    /// Marks verified signature bytes as used.
    ///
    /// Returns `false` if they were already consumed.
    pub fn consume(&mut self, signature: [u8; SIGNATURE_LEN]) -> bool {
        self.consumed.insert(signature)
    }

    /// Verifies and, on success, consumes `signature` in one step.
    ///
    /// Fails without touching any state.
    ///
    /// # Errors
    ///
    /// See [`Self::verify`].
    pub fn authorize(&mut self, message: &AuthorizationMessage, signature: &[u8]) -> Result<()> {
        let bytes = self.verify(message, signature)?;
        self.consume(bytes);
        Ok(())
    }
}
