//! Sweep Task
//!
//! Background task that periodically drops expired recipes and idle
//! rate-limit records.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::AppState;

/// Spawns a background task that sweeps the recipe cache and the limiter.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs. An interval of 0 disables sweeping; the returned task then
/// finishes immediately and expired entries are only dropped on access or by
/// the stats endpoint.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let state = AppState::from_config(&config);
/// let sweep_handle = spawn_sweep_task(state.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(state: AppState, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        if interval_secs == 0 {
            info!("Sweep task disabled");
            return;
        }

        info!(
            "Starting sweep task with interval of {} seconds",
            interval_secs
        );
        let interval = Duration::from_secs(interval_secs);

        loop {
            tokio::time::sleep(interval).await;

            let expired = state.recipes.clean_expired().await;
            let idle = state.limiter.lock().await.sweep(&state.rate_limit);

            if expired > 0 || idle > 0 {
                info!(
                    expired,
                    idle, "Sweep: removed expired recipes and idle rate-limit records"
                );
            } else {
                debug!("Sweep: nothing to remove");
            }
        }
    })
}
