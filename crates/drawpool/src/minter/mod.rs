#[cfg(test)]
mod tests;

use ed25519_dalek::VerifyingKey;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    auth::{AuthorizationMessage, ReplayGuard},
    error::{Error, Result},
    issuer::IdentifierLedger,
    ledger::{RandomnessRequest, RequestLedger},
    oracle::{OracleParams, RandomnessOracle},
    pool::{BasicPool, UniquePool},
    quota::{QuotaGovernor, QuotaLimits},
    types::{Domain, Identity, RequestId, TokenId},
};

/// Construction parameters for a [`Minter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinterConfig {
    /// Number of identifiers in the pool. Ignored by [`Minter::with_pool`],
    /// which takes it from the pool itself.
    pub capacity: u64,
    pub per_call_ceiling: u64,
    pub in_flight_slack: u64,
    pub domain: Domain,
    /// The key whose signatures authorize mint requests.
    pub signer: VerifyingKey,
}

/// Issues unique identifiers from a shrinking pool, one oracle round-trip at a
/// time.
///
/// A mint is two independent calls:
///
/// 1. [`Self::request_mint`] verifies the caller's authorization, reserves
///    quota, and opens a randomness request with the oracle.
/// 2. [`Self::fulfill`], driven by the oracle's callback, draws the requested
///    number of identifiers with the delivered random value and issues them to
///    the requester.
///
/// Every mutating method takes `&mut self` and runs to completion, so no call
/// can observe another's intermediate state. Several minters are fully
/// independent of each other.
///
/// # Example
/// ```
/// use drawpool::{Domain, MemoryLedger, Minter, MinterConfig, ScriptedOracle, TokenId, Identity};
/// use drawpool::ed25519_dalek::SigningKey;
///
/// let issuer = SigningKey::from_bytes(&[1; 32]);
/// let config = MinterConfig {
///     capacity: 5,
///     per_call_ceiling: 5,
///     in_flight_slack: 0,
///     domain: Domain::new([0; 32], 1),
///     signer: issuer.verifying_key(),
/// };
/// let mut minter = Minter::new(config, ScriptedOracle::new(), MemoryLedger::new());
///
/// let alice = Identity::from_bytes([7; 32]);
/// let signature = minter.authorization_message(alice, 2, None).sign(&issuer);
/// let request = minter.request_mint(alice, 2, None, &signature).unwrap();
///
/// let ids = minter.fulfill(request, &[7]).unwrap();
/// assert_eq!(ids, vec![TokenId(3), TokenId(4)]);
/// assert_eq!(minter.nonce_of(&alice), 1);
/// ```
#[derive(Debug)]
pub struct Minter<O, L, P = BasicPool> {
    domain: Domain,
    guard: ReplayGuard,
    quota: QuotaGovernor,
    ledger: RequestLedger,
    pool: P,
    oracle: O,
    issuer: L,
    paused: bool,
}

impl<O, L> Minter<O, L, BasicPool>
where
    O: RandomnessOracle,
    L: IdentifierLedger,
{
    /// Creates a minter over a fresh [`BasicPool`] of `config.capacity`.
    pub fn new(config: MinterConfig, oracle: O, issuer: L) -> Self {
        let pool = BasicPool::new(config.capacity);
        Self::assemble(config, pool, 0, oracle, issuer)
    }
}

impl<O, L, P> Minter<O, L, P>
where
    O: RandomnessOracle,
    L: IdentifierLedger,
    P: UniquePool,
{
    /// Creates a minter over an existing pool. Identifiers the pool already
    /// gave out count as minted.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool's lock is poisoned.
    pub fn with_pool(config: MinterConfig, pool: P, oracle: O, issuer: L) -> Result<Self> {
        let drawn = pool.capacity() - pool.try_remaining()?;
        let config = MinterConfig {
            capacity: pool.capacity(),
            ..config
        };
        Ok(Self::assemble(config, pool, drawn, oracle, issuer))
    }

    fn assemble(config: MinterConfig, pool: P, drawn: u64, oracle: O, issuer: L) -> Self {
        let mut quota = QuotaGovernor::new(QuotaLimits {
            capacity: config.capacity,
            per_call_ceiling: config.per_call_ceiling,
            in_flight_slack: config.in_flight_slack,
        });
        quota.record_minted(drawn);
        quota.reserve(drawn);

        Self {
            domain: config.domain,
            guard: ReplayGuard::new(config.signer),
            quota,
            ledger: RequestLedger::new(),
            pool,
            oracle,
            issuer,
            paused: false,
        }
    }

    /// Builds the message `caller` must have signed to request `amount`
    /// right now, bound to the caller's current nonce and this minter's
    /// domain.
    pub fn authorization_message(
        &self,
        caller: Identity,
        amount: u64,
        salt: Option<[u8; 32]>,
    ) -> AuthorizationMessage {
        AuthorizationMessage {
            caller,
            amount,
            nonce: self.ledger.nonce(&caller),
            domain: self.domain,
            salt,
        }
    }

    /// Accepts a signed mint request and forwards it to the oracle.
    ///
    /// `amount` is reserved against the quota before the oracle is called and
    /// released again if the call fails. On success the signature is consumed
    /// and a `Pending` request is opened under the oracle-issued id.
    ///
    /// # Errors
    ///
    /// - [`Error::Paused`] while the minter is paused.
    /// - [`Error::SignatureAlreadyUsed`] / [`Error::InvalidSignature`] from
    ///   the replay guard.
    /// - [`Error::ZeroAmount`], [`Error::ExceedsPerCallCeiling`],
    ///   [`Error::ExceedsInFlightCeiling`], [`Error::ExceedsPoolCapacity`]
    ///   from the quota governor.
    /// - [`Error::Oracle`] if the oracle refused the request.
    /// - [`Error::DuplicateRequestId`] if the oracle reused an id.
    ///
    /// No state changes on any error.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(caller = %caller, amount)))]
    pub fn request_mint(
        &mut self,
        caller: Identity,
        amount: u64,
        salt: Option<[u8; 32]>,
        signature: &[u8],
    ) -> Result<RequestId> {
        if self.paused {
            return Err(Error::Paused);
        }

        let message = self.authorization_message(caller, amount, salt);
        let signature = self.guard.verify(&message, signature)?;
        self.quota.admit(amount)?;

        // Quota is held across the oracle call and handed back if no request
        // gets opened.
        let id = match self.place_request(caller, amount) {
            Ok(id) => id,
            Err(e) => {
                self.quota.release(amount);
                return Err(e);
            }
        };

        self.guard.consume(signature);
        self.ledger.open(id, caller, amount, signature.to_vec())?;

        #[cfg(feature = "tracing")]
        tracing::info!(request = %id, amount, "randomness requested");
        Ok(id)
    }

    fn place_request(&mut self, requester: Identity, amount: u64) -> Result<RequestId> {
        let params = OracleParams {
            requester,
            amount,
            num_words: 1,
        };
        let id = self.oracle.request_randomness(&params)?;
        if self.ledger.contains(id) {
            return Err(Error::DuplicateRequestId(id));
        }
        Ok(id)
    }

    /// Oracle callback: draws and issues the identifiers for request `id`.
    ///
    /// The first random word seeds the draw. Identifiers are issued to the
    /// requester one by one; only when all of them are issued is the pool
    /// committed, the request marked `Fulfilled`, and the requester's nonce
    /// advanced by one.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestNotFound`] for an id this minter never opened.
    /// - [`Error::RequestAlreadyFulfilled`] on a duplicate delivery.
    /// - [`Error::EmptyRandomness`] if `random_words` is empty.
    /// - [`Error::PoolExhausted`] if the pool shrank below the requested
    ///   amount since admission.
    /// - [`Error::Issue`] if the identifier ledger refused an identifier.
    ///   Identifiers already issued by this draw are revoked.
    ///
    /// No state in the minter changes on any error; the request stays
    /// `Pending`.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(request = %id)))]
    pub fn fulfill(&mut self, id: RequestId, random_words: &[u64]) -> Result<Vec<TokenId>> {
        let request = self.ledger.pending(id)?;
        let (beneficiary, amount) = (request.requester, request.amount);
        let seed = *random_words.first().ok_or(Error::EmptyRandomness(id))?;

        let plan = self.pool.try_plan(seed, amount)?;
        let planned = plan.ids().to_vec();
        self.issue_all(beneficiary, &planned)?;

        let ids = match self.pool.try_commit(plan) {
            Ok(ids) => ids,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "pool commit failed after issue");
                self.revoke_all(beneficiary, &planned);
                return Err(e);
            }
        };
        self.quota.record_minted(ids.len() as u64);
        self.ledger.complete(id, seed)?;

        #[cfg(feature = "tracing")]
        tracing::info!(beneficiary = %beneficiary, count = ids.len(), "identifiers issued");
        Ok(ids)
    }

    fn issue_all(&mut self, beneficiary: Identity, ids: &[TokenId]) -> Result<()> {
        for (issued, &id) in ids.iter().enumerate() {
            if let Err(e) = self.issuer.issue(beneficiary, id) {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "issue failed, revoking {issued} identifiers");
                self.revoke_all(beneficiary, &ids[..issued]);
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn revoke_all(&mut self, beneficiary: Identity, ids: &[TokenId]) {
        for &id in ids.iter().rev() {
            self.issuer.revoke(beneficiary, id);
        }
    }

    /// Replaces the trusted signer. Requests already accepted are unaffected.
    pub fn rotate_signer(&mut self, signer: VerifyingKey) {
        self.guard.rotate_signer(signer);
    }

    /// Adjusts the per-call ceiling and the in-flight slack.
    pub fn set_quota_limits(&mut self, per_call_ceiling: u64, in_flight_slack: u64) {
        self.quota.set_limits(per_call_ceiling, in_flight_slack);
    }

    /// Releases quota reserved by requests the oracle will never fulfill.
    pub fn reset_requested(&mut self, requested: u64) {
        self.quota.reset_requested(requested);
    }

    /// Pausing refuses new requests; pending ones still complete.
    pub fn set_paused(&mut self, paused: bool) {
        #[cfg(feature = "tracing")]
        tracing::info!(paused, "minter pause state changed");
        self.paused = paused;
    }

    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Every request id ever opened, in opening order.
    pub fn request_ids(&self) -> &[RequestId] {
        self.ledger.request_ids()
    }

    pub fn request(&self, id: RequestId) -> Option<&RandomnessRequest> {
        self.ledger.get(id)
    }

    /// `(fulfilled, random_value)` for a request, if it exists.
    pub fn request_status(&self, id: RequestId) -> Option<(bool, Option<u64>)> {
        self.ledger.status(id)
    }

    pub fn pending_count(&self) -> usize {
        self.ledger.pending_count()
    }

    pub fn nonce_of(&self, identity: &Identity) -> u64 {
        self.ledger.nonce(identity)
    }

    pub const fn trusted_signer(&self) -> &VerifyingKey {
        self.guard.signer()
    }

    pub const fn domain(&self) -> &Domain {
        &self.domain
    }

    pub const fn quota(&self) -> &QuotaGovernor {
        &self.quota
    }

    pub fn capacity(&self) -> u64 {
        self.pool.capacity()
    }

    /// Identifiers not yet drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool's lock is poisoned.
    pub fn remaining(&self) -> Result<u64> {
        self.pool.try_remaining()
    }

    pub const fn pool(&self) -> &P {
        &self.pool
    }

    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    pub const fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub const fn issuer(&self) -> &L {
        &self.issuer
    }

    pub const fn issuer_mut(&mut self) -> &mut L {
        &mut self.issuer
    }
}
