use ed25519_dalek::VerifyingKey;
use tokio::sync::{mpsc, oneshot};

use crate::{
    auth::AuthorizationMessage,
    error::{Error, Result},
    ledger::RandomnessRequest,
    runtime::{Command, MinterStats},
    types::{Identity, RequestId, TokenId},
};

/// Cloneable async front for a minter running on its own task.
///
/// Every method enqueues one [`Command`] and waits for the task's answer.
/// Once the task has stopped, every method returns [`Error::MinterStopped`].
#[derive(Clone, Debug)]
pub struct MinterHandle {
    tx: mpsc::Sender<Command>,
}

impl MinterHandle {
    pub(crate) const fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(command(response))
            .await
            .map_err(|_| Error::MinterStopped)?;
        rx.await.map_err(|_| Error::MinterStopped)
    }

    /// See [`Minter::authorization_message`](crate::Minter::authorization_message).
    ///
    /// The nonce in the returned message may be stale by the time a mint
    /// request signed over it arrives, if a fulfillment for the same caller
    /// lands in between.
    pub async fn authorization_message(
        &self,
        caller: Identity,
        amount: u64,
        salt: Option<[u8; 32]>,
    ) -> Result<AuthorizationMessage> {
        self.call(|response| Command::AuthorizationMessage {
            caller,
            amount,
            salt,
            response,
        })
        .await
    }

    /// See [`Minter::request_mint`](crate::Minter::request_mint).
    pub async fn request_mint(
        &self,
        caller: Identity,
        amount: u64,
        salt: Option<[u8; 32]>,
        signature: Vec<u8>,
    ) -> Result<RequestId> {
        self.call(|response| Command::RequestMint {
            caller,
            amount,
            salt,
            signature,
            response,
        })
        .await?
    }

    /// See [`Minter::fulfill`](crate::Minter::fulfill).
    pub async fn fulfill(&self, id: RequestId, random_words: Vec<u64>) -> Result<Vec<TokenId>> {
        self.call(|response| Command::Fulfill {
            id,
            random_words,
            response,
        })
        .await?
    }

    pub async fn request(&self, id: RequestId) -> Result<Option<RandomnessRequest>> {
        self.call(|response| Command::Request { id, response }).await
    }

    pub async fn request_ids(&self) -> Result<Vec<RequestId>> {
        self.call(|response| Command::RequestIds { response }).await
    }

    pub async fn nonce_of(&self, identity: Identity) -> Result<u64> {
        self.call(|response| Command::Nonce { identity, response })
            .await
    }

    pub async fn trusted_signer(&self) -> Result<VerifyingKey> {
        self.call(|response| Command::Signer { response }).await
    }

    pub async fn stats(&self) -> Result<MinterStats> {
        self.call(|response| Command::Stats { response }).await?
    }

    pub async fn rotate_signer(&self, signer: VerifyingKey) -> Result<()> {
        self.call(|response| Command::RotateSigner { signer, response })
            .await
    }

    pub async fn set_paused(&self, paused: bool) -> Result<()> {
        self.call(|response| Command::SetPaused { paused, response })
            .await
    }

    pub async fn set_quota_limits(&self, per_call_ceiling: u64, in_flight_slack: u64) -> Result<()> {
        self.call(|response| Command::SetQuotaLimits {
            per_call_ceiling,
            in_flight_slack,
            response,
        })
        .await
    }

    pub async fn reset_requested(&self, requested: u64) -> Result<()> {
        self.call(|response| Command::ResetRequested {
            requested,
            response,
        })
        .await
    }

    /// Stops the minter task once the commands queued ahead of this one
    /// have run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MinterStopped`] if the task already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        self.call(|response| Command::Shutdown { response }).await
    }

    /// Whether the minter task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
