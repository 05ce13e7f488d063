//! In-process randomness oracle.
//!
//! Drains the requests placed through a [`ChannelOracle`] and, when
//! simulation is enabled, answers each one after a fixed delay with a fresh
//! random word. With simulation disabled the requests are only logged and an
//! external oracle is expected to call `Fulfill`.
//!
//! [`ChannelOracle`]: drawpool_tonic_core::drawpool::ChannelOracle

use core::time::Duration;
use drawpool_tonic_core::drawpool::{MinterHandle, OracleRequest};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::server::telemetry::{increment_fulfillment_errors, increment_fulfillments};

/// Runs until `shutdown` is cancelled or the minter drops its oracle.
pub async fn oracle_loop(
    mut requests: mpsc::UnboundedReceiver<OracleRequest>,
    handle: MinterHandle,
    simulate: bool,
    delay: Duration,
    shutdown: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Oracle task started (simulate = {simulate})");

    let mut rng = StdRng::from_os_rng();

    loop {
        let request = tokio::select! {
            () = shutdown.cancelled() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        if !simulate {
            #[cfg(feature = "tracing")]
            tracing::info!(
                request = %request.id,
                amount = request.params.amount,
                "Awaiting external fulfillment"
            );
            continue;
        }

        if !delay.is_zero() {
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        let words = (0..request.params.num_words.max(1))
            .map(|_| rng.random::<u64>())
            .collect();
        match handle.fulfill(request.id, words).await {
            Ok(ids) => {
                increment_fulfillments(ids.len() as u64);
                #[cfg(feature = "tracing")]
                tracing::debug!(request = %request.id, count = ids.len(), "Fulfilled");
            }
            Err(_e) => {
                increment_fulfillment_errors();
                #[cfg(feature = "tracing")]
                tracing::warn!(request = %request.id, "Fulfillment failed: {_e}");
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Oracle task stopped");
}
