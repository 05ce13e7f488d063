use std::collections::HashSet;

use ed25519_dalek::SigningKey;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Domain, Error, IdentifierLedger, Identity, IssueError, LockPool, MemoryLedger, Minter,
    MinterConfig, OracleError, OracleParams, PoolState, RandomnessOracle, RequestId,
    RequestState, ScriptedOracle, TokenId, UniquePool,
};

const ALICE: Identity = Identity::from_bytes([0xA1; 32]);
const BOB: Identity = Identity::from_bytes([0xB0; 32]);

struct Fixture {
    issuer: SigningKey,
    minter: Minter<ScriptedOracle, MemoryLedger>,
}

impl Fixture {
    fn new(capacity: u64, per_call_ceiling: u64, in_flight_slack: u64) -> Self {
        let issuer = SigningKey::from_bytes(&[0x5E; 32]);
        let config = MinterConfig {
            capacity,
            per_call_ceiling,
            in_flight_slack,
            domain: Domain::new([0xD0; 32], 8453),
            signer: issuer.verifying_key(),
        };
        Self {
            issuer,
            minter: Minter::new(config, ScriptedOracle::new(), MemoryLedger::new()),
        }
    }

    fn sign(&self, caller: Identity, amount: u64, salt: Option<[u8; 32]>) -> [u8; 64] {
        self.minter
            .authorization_message(caller, amount, salt)
            .sign(&self.issuer)
    }

    fn request(&mut self, caller: Identity, amount: u64, salt: Option<[u8; 32]>) -> RequestId {
        let sig = self.sign(caller, amount, salt);
        self.minter.request_mint(caller, amount, salt, &sig).unwrap()
    }
}

#[test]
fn request_then_fulfill_issues_documented_identifiers() {
    let mut fx = Fixture::new(5, 5, 0);
    let id = fx.request(ALICE, 2, None);

    assert_eq!(fx.minter.request_status(id), Some((false, None)));
    assert_eq!(fx.minter.quota().requested(), 2);
    assert_eq!(fx.minter.oracle().requests().len(), 1);
    assert_eq!(fx.minter.oracle().requests()[0].1.amount, 2);

    let ids = fx.minter.fulfill(id, &[7, 1234]).unwrap();
    assert_eq!(ids, vec![TokenId(3), TokenId(4)]);
    assert_eq!(fx.minter.remaining().unwrap(), 3);
    assert_eq!(fx.minter.quota().minted(), 2);
    assert_eq!(fx.minter.request_status(id), Some((true, Some(7))));
    assert_eq!(fx.minter.issuer().tokens_of(&ALICE), ids);
}

#[test]
fn same_signature_twice_is_replay() {
    let mut fx = Fixture::new(10, 5, 0);
    let sig = fx.sign(ALICE, 1, None);

    let id = fx.minter.request_mint(ALICE, 1, None, &sig).unwrap();
    assert_eq!(
        fx.minter.request_mint(ALICE, 1, None, &sig).unwrap_err(),
        Error::SignatureAlreadyUsed
    );

    // Still a replay after the nonce moved on.
    fx.minter.fulfill(id, &[3]).unwrap();
    assert_eq!(
        fx.minter.request_mint(ALICE, 1, None, &sig).unwrap_err(),
        Error::SignatureAlreadyUsed
    );
    assert_eq!(fx.minter.request_ids(), &[id]);
}

#[test]
fn signature_over_stale_nonce_is_rejected() {
    let mut fx = Fixture::new(10, 5, 0);
    let first_salt = Some([1; 32]);
    let second_salt = Some([2; 32]);

    // Both signed at nonce 0.
    let first = fx.sign(ALICE, 1, first_salt);
    let second = fx.sign(ALICE, 1, second_salt);

    let id = fx.minter.request_mint(ALICE, 1, first_salt, &first).unwrap();
    fx.minter.fulfill(id, &[0]).unwrap();
    assert_eq!(fx.minter.nonce_of(&ALICE), 1);

    assert_eq!(
        fx.minter
            .request_mint(ALICE, 1, second_salt, &second)
            .unwrap_err(),
        Error::InvalidSignature
    );
}

#[test]
fn nonce_advances_once_per_request_whatever_the_amount() {
    let mut fx = Fixture::new(20, 10, 0);
    let big = fx.request(ALICE, 10, Some([1; 32]));
    let small = fx.request(ALICE, 1, Some([2; 32]));
    assert_eq!(fx.minter.nonce_of(&ALICE), 0);

    fx.minter.fulfill(big, &[99]).unwrap();
    assert_eq!(fx.minter.nonce_of(&ALICE), 1);
    fx.minter.fulfill(small, &[5]).unwrap();
    assert_eq!(fx.minter.nonce_of(&ALICE), 2);
    assert_eq!(fx.minter.nonce_of(&BOB), 0);
}

#[test]
fn admission_uses_counters_at_open_time() {
    let mut fx = Fixture::new(5, 3, 10);
    let first = fx.request(ALICE, 3, Some([1; 32]));
    let second = fx.request(BOB, 3, None);

    fx.minter.fulfill(first, &[11]).unwrap();
    assert_eq!(fx.minter.remaining().unwrap(), 2);

    assert_eq!(
        fx.minter.fulfill(second, &[12]).unwrap_err(),
        Error::PoolExhausted {
            requested: 3,
            remaining: 2
        }
    );
    assert_eq!(fx.minter.request_status(second), Some((false, None)));
    assert_eq!(fx.minter.nonce_of(&BOB), 0);
    assert_eq!(fx.minter.remaining().unwrap(), 2);
    assert_eq!(fx.minter.pending_count(), 1);
}

#[test]
fn unknown_and_duplicate_fulfillments_are_rejected() {
    let mut fx = Fixture::new(10, 5, 0);
    assert_eq!(
        fx.minter.fulfill(RequestId(404), &[1]).unwrap_err(),
        Error::RequestNotFound(RequestId(404))
    );

    let id = fx.request(ALICE, 2, None);
    fx.minter.fulfill(id, &[1]).unwrap();
    assert_eq!(
        fx.minter.fulfill(id, &[2]).unwrap_err(),
        Error::RequestAlreadyFulfilled(id)
    );
    assert_eq!(fx.minter.remaining().unwrap(), 8);
    assert_eq!(fx.minter.issuer().len(), 2);
    assert_eq!(fx.minter.nonce_of(&ALICE), 1);
}

#[test]
fn empty_randomness_is_rejected() {
    let mut fx = Fixture::new(10, 5, 0);
    let id = fx.request(ALICE, 1, None);
    assert_eq!(
        fx.minter.fulfill(id, &[]).unwrap_err(),
        Error::EmptyRandomness(id)
    );
    assert_eq!(
        fx.minter.request(id).map(|r| r.state),
        Some(RequestState::Pending)
    );
}

#[test]
fn rejected_requests_leave_no_trace() {
    let mut fx = Fixture::new(10, 2, 0);
    let sig = fx.sign(ALICE, 3, None);

    assert!(matches!(
        fx.minter.request_mint(ALICE, 3, None, &sig),
        Err(Error::ExceedsPerCallCeiling { .. })
    ));
    assert_eq!(fx.minter.quota().requested(), 0);
    assert!(fx.minter.request_ids().is_empty());
    assert!(fx.minter.oracle().requests().is_empty());

    // The signature was not consumed, so it works once the ceiling is raised.
    fx.minter.set_quota_limits(3, 0);
    fx.minter.request_mint(ALICE, 3, None, &sig).unwrap();
}

#[test]
fn oracle_failure_leaves_no_trace() {
    let mut fx = Fixture::new(10, 5, 0);
    let sig = fx.sign(ALICE, 2, None);

    fx.minter.oracle_mut().fail_next("subscription out of funds");
    assert!(matches!(
        fx.minter.request_mint(ALICE, 2, None, &sig),
        Err(Error::Oracle(_))
    ));
    assert_eq!(fx.minter.quota().requested(), 0);
    assert!(fx.minter.request_ids().is_empty());

    fx.minter.request_mint(ALICE, 2, None, &sig).unwrap();
}

/// Hands out the same id on every call.
struct StuckOracle(RequestId);

impl RandomnessOracle for StuckOracle {
    fn request_randomness(&mut self, _params: &OracleParams) -> Result<RequestId, OracleError> {
        Ok(self.0)
    }
}

#[test]
fn reused_oracle_id_hands_the_reservation_back() {
    let issuer = SigningKey::from_bytes(&[0x5E; 32]);
    let config = MinterConfig {
        capacity: 4,
        per_call_ceiling: 4,
        in_flight_slack: 0,
        domain: Domain::new([0xD0; 32], 8453),
        signer: issuer.verifying_key(),
    };
    let mut minter = Minter::new(config, StuckOracle(RequestId(7)), MemoryLedger::new());

    let sig = minter.authorization_message(ALICE, 3, None).sign(&issuer);
    assert_eq!(minter.request_mint(ALICE, 3, None, &sig).unwrap(), RequestId(7));
    assert_eq!(minter.quota().requested(), 3);

    let sig = minter.authorization_message(BOB, 1, None).sign(&issuer);
    assert_eq!(
        minter.request_mint(BOB, 1, None, &sig).unwrap_err(),
        Error::DuplicateRequestId(RequestId(7))
    );
    assert_eq!(minter.quota().requested(), 3);
    assert_eq!(minter.request_ids(), &[RequestId(7)]);

    // The rejected signature was never consumed.
    minter.oracle_mut().0 = RequestId(8);
    assert_eq!(minter.request_mint(BOB, 1, None, &sig).unwrap(), RequestId(8));
    assert_eq!(minter.quota().requested(), 4);
}

#[test]
fn oracle_out_of_ids_rejects_cleanly() {
    let issuer = SigningKey::from_bytes(&[0x5E; 32]);
    let config = MinterConfig {
        capacity: 4,
        per_call_ceiling: 4,
        in_flight_slack: 0,
        domain: Domain::default(),
        signer: issuer.verifying_key(),
    };
    let mut minter = Minter::new(
        config,
        ScriptedOracle::starting_at(u64::MAX),
        MemoryLedger::new(),
    );

    let sig = minter.authorization_message(ALICE, 1, None).sign(&issuer);
    assert_eq!(
        minter.request_mint(ALICE, 1, None, &sig).unwrap_err(),
        Error::Oracle(OracleError::new("request ids exhausted"))
    );
    assert_eq!(minter.quota().requested(), 0);
    assert!(minter.request_ids().is_empty());
    assert!(minter.oracle().requests().is_empty());
}

#[test]
fn wrong_domain_signature_is_rejected() {
    let mut fx = Fixture::new(10, 5, 0);
    let mut message = fx.minter.authorization_message(ALICE, 1, None);
    message.domain.network_id = 1;
    let sig = message.sign(&fx.issuer);

    assert_eq!(
        fx.minter.request_mint(ALICE, 1, None, &sig).unwrap_err(),
        Error::InvalidSignature
    );
}

#[test]
fn paused_minter_refuses_requests_but_completes_pending() {
    let mut fx = Fixture::new(10, 5, 0);
    let id = fx.request(ALICE, 2, None);

    fx.minter.set_paused(true);
    assert!(fx.minter.is_paused());
    let sig = fx.sign(BOB, 1, None);
    assert_eq!(
        fx.minter.request_mint(BOB, 1, None, &sig).unwrap_err(),
        Error::Paused
    );

    assert_eq!(fx.minter.fulfill(id, &[4]).unwrap().len(), 2);

    fx.minter.set_paused(false);
    fx.minter.request_mint(BOB, 1, None, &sig).unwrap();
}

#[test]
fn signer_rotation_spares_pending_requests() {
    let mut fx = Fixture::new(10, 5, 0);
    let pending = fx.request(ALICE, 1, None);
    let unsubmitted = fx.sign(BOB, 1, None);

    let new_issuer = SigningKey::from_bytes(&[0x77; 32]);
    fx.minter.rotate_signer(new_issuer.verifying_key());
    assert_eq!(fx.minter.trusted_signer(), &new_issuer.verifying_key());

    assert_eq!(
        fx.minter
            .request_mint(BOB, 1, None, &unsubmitted)
            .unwrap_err(),
        Error::InvalidSignature
    );
    fx.minter.fulfill(pending, &[8]).unwrap();

    fx.issuer = new_issuer;
    fx.request(BOB, 1, None);
}

#[test]
fn failed_issue_rolls_the_draw_back() {
    let mut fx = Fixture::new(5, 5, 0);
    let id = fx.request(ALICE, 2, None);

    // seed 7 draws 3 then 4; make the second one fail.
    fx.minter.issuer_mut().reject(TokenId(4));
    assert_eq!(
        fx.minter.fulfill(id, &[7]).unwrap_err(),
        Error::Issue(IssueError::Rejected {
            id: TokenId(4),
            reason: "rejected by ledger".to_string()
        })
    );

    assert!(fx.minter.issuer().is_empty());
    assert_eq!(fx.minter.remaining().unwrap(), 5);
    assert_eq!(fx.minter.quota().minted(), 0);
    assert_eq!(fx.minter.nonce_of(&ALICE), 0);
    assert_eq!(fx.minter.request_status(id), Some((false, None)));

    // A different word draws identifiers the ledger accepts.
    assert_eq!(fx.minter.fulfill(id, &[0]).unwrap(), vec![TokenId(1), TokenId(5)]);
}

#[test]
fn out_of_order_completions_never_repeat_an_identifier() {
    const CAPACITY: u64 = 200;
    let mut fx = Fixture::new(CAPACITY, 4, 0);
    let mut rng = StdRng::seed_from_u64(0xF00D);
    let mut open = Vec::new();
    let mut issued = HashSet::new();
    let mut salt = 0u64;

    while fx.minter.quota().requested() < CAPACITY || !open.is_empty() {
        let room = CAPACITY - fx.minter.quota().requested();
        if room > 0 && (open.is_empty() || rng.random_bool(0.6)) {
            let caller = if rng.random_bool(0.5) { ALICE } else { BOB };
            let amount = rng.random_range(1..=room.min(4));
            salt += 1;
            let mut bytes = [0u8; 32];
            bytes[..8].copy_from_slice(&salt.to_be_bytes());
            open.push(fx.request(caller, amount, Some(bytes)));
        } else {
            let pick = rng.random_range(0..open.len());
            let id = open.swap_remove(pick);
            for token in fx.minter.fulfill(id, &[rng.random::<u64>()]).unwrap() {
                assert!((1..=CAPACITY).contains(&token.get()));
                assert!(issued.insert(token), "{token} issued twice");
            }
        }
    }

    assert_eq!(issued.len() as u64, CAPACITY);
    assert_eq!(fx.minter.remaining().unwrap(), 0);
    assert_eq!(
        fx.minter.nonce_of(&ALICE) + fx.minter.nonce_of(&BOB),
        fx.minter.request_ids().len() as u64
    );
}

#[test]
fn independent_minters_do_not_share_state() {
    let mut first = Fixture::new(5, 5, 0);
    let mut second = Fixture::new(5, 5, 0);

    let a = first.request(ALICE, 5, None);
    first.minter.fulfill(a, &[1]).unwrap();
    assert_eq!(first.minter.remaining().unwrap(), 0);

    // Same signer, same message: a fresh minter has its own replay set.
    let b = second.request(ALICE, 5, None);
    assert_eq!(second.minter.fulfill(b, &[1]).unwrap().len(), 5);
}

#[test]
fn restored_pool_counts_as_minted() {
    let issuer = SigningKey::from_bytes(&[0x5E; 32]);
    let mut state = PoolState::new(10);
    state.draw(3, 6).unwrap();
    let pool = LockPool::from_state(state);
    let observer = pool.clone();

    let config = MinterConfig {
        capacity: 0,
        per_call_ceiling: 10,
        in_flight_slack: 0,
        domain: Domain::default(),
        signer: issuer.verifying_key(),
    };
    let mut minter =
        Minter::with_pool(config, pool, ScriptedOracle::new(), MemoryLedger::new()).unwrap();
    assert_eq!(minter.capacity(), 10);
    assert_eq!(minter.quota().minted(), 6);

    let sig = minter.authorization_message(ALICE, 5, None).sign(&issuer);
    assert!(matches!(
        minter.request_mint(ALICE, 5, None, &sig),
        Err(Error::ExceedsInFlightCeiling { .. })
    ));

    let sig = minter.authorization_message(ALICE, 4, None).sign(&issuer);
    let id = minter.request_mint(ALICE, 4, None, &sig).unwrap();
    minter.fulfill(id, &[2]).unwrap();
    assert_eq!(observer.try_remaining().unwrap(), 0);
}

#[test]
fn boxed_collaborators_work() {
    let issuer = SigningKey::from_bytes(&[0x5E; 32]);
    let config = MinterConfig {
        capacity: 3,
        per_call_ceiling: 3,
        in_flight_slack: 0,
        domain: Domain::default(),
        signer: issuer.verifying_key(),
    };
    let ledger: Box<dyn IdentifierLedger> = Box::new(MemoryLedger::new());
    let mut minter = Minter::new(config, Box::new(ScriptedOracle::starting_at(9)), ledger);

    let sig = minter.authorization_message(ALICE, 3, None).sign(&issuer);
    let id = minter.request_mint(ALICE, 3, None, &sig).unwrap();
    assert_eq!(id, RequestId(9));
    assert_eq!(minter.fulfill(id, &[u64::MAX]).unwrap().len(), 3);
}
