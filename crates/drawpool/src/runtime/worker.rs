use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    issuer::IdentifierLedger,
    minter::Minter,
    oracle::RandomnessOracle,
    pool::UniquePool,
    runtime::{Command, MinterHandle, MinterStats},
};

/// Moves `minter` onto its own task and returns a handle to it.
///
/// `buffer` bounds the command queue; senders wait when it is full. The task
/// ends on [`MinterHandle::shutdown`] or when every handle is dropped, and
/// the join handle yields the minter back in its final state.
pub fn spawn_minter<O, L, P>(
    minter: Minter<O, L, P>,
    buffer: usize,
) -> (MinterHandle, JoinHandle<Minter<O, L, P>>)
where
    O: RandomnessOracle + Send + 'static,
    L: IdentifierLedger + Send + 'static,
    P: UniquePool + Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let task = tokio::spawn(minter_loop(minter, rx));
    (MinterHandle::new(tx), task)
}

/// Processes [`Command`]s against `minter` until shutdown.
///
/// Each command runs to completion before the next is received.
pub async fn minter_loop<O, L, P>(
    mut minter: Minter<O, L, P>,
    mut rx: mpsc::Receiver<Command>,
) -> Minter<O, L, P>
where
    O: RandomnessOracle,
    L: IdentifierLedger,
    P: UniquePool,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("minter task started");

    while let Some(command) = rx.recv().await {
        match command {
            Command::AuthorizationMessage {
                caller,
                amount,
                salt,
                response,
            } => {
                let _ = response.send(minter.authorization_message(caller, amount, salt));
            }
            Command::RequestMint {
                caller,
                amount,
                salt,
                signature,
                response,
            } => {
                let result = minter.request_mint(caller, amount, salt, &signature);
                #[cfg(feature = "tracing")]
                if let Err(e) = &result {
                    tracing::debug!(error = %e, "mint request rejected");
                }
                let _ = response.send(result);
            }
            Command::Fulfill {
                id,
                random_words,
                response,
            } => {
                let result = minter.fulfill(id, &random_words);
                #[cfg(feature = "tracing")]
                if let Err(e) = &result {
                    tracing::warn!(request = %id, error = %e, "fulfillment rejected");
                }
                let _ = response.send(result);
            }
            Command::Request { id, response } => {
                let _ = response.send(minter.request(id).cloned());
            }
            Command::RequestIds { response } => {
                let _ = response.send(minter.request_ids().to_vec());
            }
            Command::Nonce { identity, response } => {
                let _ = response.send(minter.nonce_of(&identity));
            }
            Command::Signer { response } => {
                let _ = response.send(*minter.trusted_signer());
            }
            Command::Stats { response } => {
                let stats = minter.remaining().map(|remaining| {
                    let quota = minter.quota();
                    MinterStats {
                        capacity: minter.capacity(),
                        remaining,
                        minted: quota.minted(),
                        requested: quota.requested(),
                        per_call_ceiling: quota.limits().per_call_ceiling,
                        in_flight_slack: quota.limits().in_flight_slack,
                        pending: minter.pending_count(),
                        paused: minter.is_paused(),
                    }
                });
                let _ = response.send(stats);
            }
            Command::RotateSigner { signer, response } => {
                minter.rotate_signer(signer);
                let _ = response.send(());
            }
            Command::SetPaused { paused, response } => {
                minter.set_paused(paused);
                let _ = response.send(());
            }
            Command::SetQuotaLimits {
                per_call_ceiling,
                in_flight_slack,
                response,
            } => {
                minter.set_quota_limits(per_call_ceiling, in_flight_slack);
                let _ = response.send(());
            }
            Command::ResetRequested {
                requested,
                response,
            } => {
                minter.reset_requested(requested);
                let _ = response.send(());
            }
            Command::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("minter task received shutdown signal");
                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("minter task stopped");
    minter
}
