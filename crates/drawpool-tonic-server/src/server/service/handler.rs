//! gRPC service implementation for identifier minting.
//!
//! [`MintService`] implements the generated `Minter` service on top of a
//! [`MinterHandle`]. The minter itself runs on its own task, so every RPC is
//! one command round-trip and concurrent RPCs are serialized there.
//!
//! ## Responsibilities
//!
//! - Spawn the minter task and the oracle task.
//! - Parse and length-check raw protobuf fields.
//! - Gate `Fulfill` and the admin RPCs behind the admin token.
//! - Refuse new work once shutdown has started.

use crate::server::{
    config::ServerConfig,
    oracle::oracle_loop,
    telemetry::{
        increment_fulfillment_errors, increment_fulfillments, increment_mint_rejections,
        record_mint_request,
    },
};
use core::time::Duration;
use drawpool_tonic_core::{
    Error,
    drawpool::{ChannelOracle, MemoryLedger, Minter, MinterHandle, RequestId, spawn_minter},
    proto::{
        FulfillRequest, FulfillResponse, GetAuthorizationRequest, GetAuthorizationResponse,
        GetNonceRequest, GetNonceResponse, GetPoolRequest, GetRequestRequest, GetSignerRequest,
        GetSignerResponse, ListRequestsRequest, ListRequestsResponse, PoolStatus, RequestInfo,
        RequestMintRequest, RequestMintResponse, ResetRequestedRequest, ResetRequestedResponse,
        RotateSignerRequest, RotateSignerResponse,
        SetPausedRequest, SetPausedResponse, SetQuotaLimitsRequest, SetQuotaLimitsResponse,
        minter_server,
    },
    types::{
        ADMIN_TOKEN_HEADER, parse_identity, parse_salt, parse_signature, parse_verifying_key,
    },
};
use std::sync::Arc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC front for a single minter.
///
/// Cloning is cheap; every clone talks to the same minter task.
#[derive(Clone)]
pub struct MintService {
    config: Arc<ServerConfig>,
    handle: MinterHandle,
    shutdown_token: CancellationToken,
}

impl MintService {
    /// Spawns the minter task over a fresh pool and the oracle task that
    /// answers its randomness requests.
    pub fn new(config: ServerConfig) -> Self {
        let (oracle, requests) = ChannelOracle::new();
        let minter = Minter::new(config.minter, oracle, MemoryLedger::new());
        let (handle, _task) = spawn_minter(minter, config.command_buffer_size);
        let shutdown_token = CancellationToken::new();

        tokio::spawn(oracle_loop(
            requests,
            handle.clone(),
            config.oracle_enabled,
            Duration::from_millis(config.oracle_delay_ms),
            shutdown_token.clone(),
        ));

        Self {
            config: Arc::new(config),
            handle,
            shutdown_token,
        }
    }

    /// Refuses new RPCs, stops the oracle task and then the minter task.
    ///
    /// Commands already queued on the minter still run. Waits at most
    /// `shutdown_timeout` seconds for the minter to acknowledge.
    pub async fn shutdown(&self) -> Result<(), Error> {
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new requests");
        self.shutdown_token.cancel();

        let wait = Duration::from_secs(self.config.shutdown_timeout);
        match timeout(wait, self.handle.shutdown()).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::ChannelError {
                context: "minter task did not acknowledge shutdown".to_string(),
            }),
        }
    }

    fn ensure_running(&self) -> Result<(), Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }
        Ok(())
    }

    fn ensure_admin<T>(&self, request: &Request<T>) -> Result<(), Error> {
        self.ensure_running()?;
        let expected = self
            .config
            .admin_token
            .as_deref()
            .ok_or(Error::Unauthorized)?;
        let presented = request
            .metadata()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Rejected admin call");
            return Err(Error::Unauthorized);
        }
        Ok(())
    }
}

#[tonic::async_trait]
impl minter_server::Minter for MintService {
    async fn get_authorization(
        &self,
        req: Request<GetAuthorizationRequest>,
    ) -> Result<Response<GetAuthorizationResponse>, Status> {
        self.ensure_running()?;
        let req = req.into_inner();
        let caller = parse_identity("caller", &req.caller)?;
        let salt = parse_salt(req.salt.as_deref())?;
        let message = self
            .handle
            .authorization_message(caller, req.amount, salt)
            .await
            .map_err(Error::from)?;
        Ok(Response::new(GetAuthorizationResponse::from(&message)))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(amount = req.get_ref().amount)))]
    async fn request_mint(
        &self,
        req: Request<RequestMintRequest>,
    ) -> Result<Response<RequestMintResponse>, Status> {
        self.ensure_running()?;
        let req = req.into_inner();
        let caller = parse_identity("caller", &req.caller)?;
        let salt = parse_salt(req.salt.as_deref())?;
        let signature = parse_signature(&req.signature)?;

        match self
            .handle
            .request_mint(caller, req.amount, salt, signature)
            .await
        {
            Ok(id) => {
                record_mint_request(req.amount);
                Ok(Response::new(RequestMintResponse { request_id: id.0 }))
            }
            Err(e) => {
                increment_mint_rejections();
                #[cfg(feature = "tracing")]
                tracing::info!("Mint request rejected: {e}");
                Err(Error::from(e).into())
            }
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(request = req.get_ref().request_id)))]
    async fn fulfill(
        &self,
        req: Request<FulfillRequest>,
    ) -> Result<Response<FulfillResponse>, Status> {
        self.ensure_admin(&req)?;
        let req = req.into_inner();

        match self
            .handle
            .fulfill(RequestId(req.request_id), req.random_words)
            .await
        {
            Ok(ids) => {
                increment_fulfillments(ids.len() as u64);
                Ok(Response::new(FulfillResponse {
                    token_ids: ids.into_iter().map(|id| id.get()).collect(),
                }))
            }
            Err(e) => {
                increment_fulfillment_errors();
                Err(Error::from(e).into())
            }
        }
    }

    async fn get_request(
        &self,
        req: Request<GetRequestRequest>,
    ) -> Result<Response<RequestInfo>, Status> {
        self.ensure_running()?;
        let id = RequestId(req.into_inner().request_id);
        let request = self
            .handle
            .request(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::from(drawpool_tonic_core::drawpool::Error::RequestNotFound(id)))?;
        Ok(Response::new(RequestInfo::from(&request)))
    }

    async fn list_requests(
        &self,
        _req: Request<ListRequestsRequest>,
    ) -> Result<Response<ListRequestsResponse>, Status> {
        self.ensure_running()?;
        let ids = self.handle.request_ids().await.map_err(Error::from)?;
        Ok(Response::new(ListRequestsResponse {
            request_ids: ids.into_iter().map(|id| id.0).collect(),
        }))
    }

    async fn get_nonce(
        &self,
        req: Request<GetNonceRequest>,
    ) -> Result<Response<GetNonceResponse>, Status> {
        self.ensure_running()?;
        let identity = parse_identity("identity", &req.into_inner().identity)?;
        let nonce = self.handle.nonce_of(identity).await.map_err(Error::from)?;
        Ok(Response::new(GetNonceResponse { nonce }))
    }

    async fn get_signer(
        &self,
        _req: Request<GetSignerRequest>,
    ) -> Result<Response<GetSignerResponse>, Status> {
        self.ensure_running()?;
        let signer = self.handle.trusted_signer().await.map_err(Error::from)?;
        Ok(Response::new(GetSignerResponse {
            signer: signer.as_bytes().to_vec(),
        }))
    }

    async fn get_pool(
        &self,
        _req: Request<GetPoolRequest>,
    ) -> Result<Response<PoolStatus>, Status> {
        self.ensure_running()?;
        let stats = self.handle.stats().await.map_err(Error::from)?;
        Ok(Response::new(PoolStatus::from(stats)))
    }

    async fn rotate_signer(
        &self,
        req: Request<RotateSignerRequest>,
    ) -> Result<Response<RotateSignerResponse>, Status> {
        self.ensure_admin(&req)?;
        let signer = parse_verifying_key(&req.into_inner().signer)?;
        self.handle
            .rotate_signer(signer)
            .await
            .map_err(Error::from)?;
        Ok(Response::new(RotateSignerResponse {}))
    }

    async fn set_paused(
        &self,
        req: Request<SetPausedRequest>,
    ) -> Result<Response<SetPausedResponse>, Status> {
        self.ensure_admin(&req)?;
        self.handle
            .set_paused(req.into_inner().paused)
            .await
            .map_err(Error::from)?;
        Ok(Response::new(SetPausedResponse {}))
    }

    async fn set_quota_limits(
        &self,
        req: Request<SetQuotaLimitsRequest>,
    ) -> Result<Response<SetQuotaLimitsResponse>, Status> {
        self.ensure_admin(&req)?;
        let req = req.into_inner();
        if req.per_call_ceiling == 0 {
            return Err(Error::invalid("per_call_ceiling must be greater than 0").into());
        }
        self.handle
            .set_quota_limits(req.per_call_ceiling, req.in_flight_slack)
            .await
            .map_err(Error::from)?;
        Ok(Response::new(SetQuotaLimitsResponse {}))
    }

    async fn reset_requested(
        &self,
        req: Request<ResetRequestedRequest>,
    ) -> Result<Response<ResetRequestedResponse>, Status> {
        self.ensure_admin(&req)?;
        self.handle
            .reset_requested(req.into_inner().requested)
            .await
            .map_err(Error::from)?;
        let stats = self.handle.stats().await.map_err(Error::from)?;
        Ok(Response::new(ResetRequestedResponse {
            requested: stats.requested,
        }))
    }
}
