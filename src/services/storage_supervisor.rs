//! Keeps the storage connection alive in the background, flipping the shared
//! degraded flag as connectivity comes and goes. The scorekeeping surface
//! never blocks on any of this.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{match_store::MatchStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

fn backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_DELAY)
}

/// Connect to the storage backend and keep it healthy, re-entering degraded
/// mode whenever it becomes unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn MatchStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = backoff(delay);
                continue;
            }
        };

        state.set_match_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        delay = INITIAL_DELAY;

        // Poll health until the connection is beyond in-place recovery, then
        // drop the store and rebuild from scratch.
        loop {
            sleep(HEALTH_POLL_INTERVAL).await;
            if store.health_check().await.is_ok() {
                state.update_degraded(false).await;
                continue;
            }

            warn!("storage health check failed; entering degraded mode");
            state.update_degraded(true).await;

            let mut attempt = 0;
            let mut reconnect_delay = INITIAL_DELAY;
            let mut recovered = false;
            while attempt < MAX_RECONNECT_ATTEMPTS {
                match store.try_reconnect().await {
                    Ok(()) => {
                        recovered = true;
                        break;
                    }
                    Err(err) => {
                        attempt += 1;
                        warn!(attempt, error = %err, "storage reconnect attempt failed");
                        sleep(reconnect_delay).await;
                        reconnect_delay = backoff(reconnect_delay);
                    }
                }
            }

            if recovered {
                info!("storage reconnected; leaving degraded mode");
                state.update_degraded(false).await;
            } else {
                warn!("exhausted storage reconnect attempts; rebuilding the connection");
                state.clear_match_store().await;
                break;
            }
        }
    }
}
