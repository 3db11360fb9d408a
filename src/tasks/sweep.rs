//! Callback Sweep Task
//!
//! Background task that periodically removes expired buffered callback
//! results from a correlator's pending state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::callbacks::pending::{lock_pending, SharedPending};

/// Shortest interval the sweep runs at.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Sweep interval for a given store duration: half of it, at least 1ms.
pub fn sweep_interval(store_duration: Duration) -> Duration {
    (store_duration / 2).max(MIN_SWEEP_INTERVAL)
}

/// Spawns a background task that periodically sweeps expired buffered
/// results.
///
/// The task exits when `shutdown` changes or its sender is dropped. Waiters
/// are never touched; they leave only through delivery or their own timeout.
///
/// # Arguments
/// * `pending` - shared pending state of the correlator
/// * `interval` - time between sweeps
/// * `shutdown` - stop signal
///
/// # Returns
/// A JoinHandle that resolves once the task has fully stopped.
///
/// # Example
/// ```ignore
/// let (stop_tx, stop_rx) = watch::channel(false);
/// let handle = spawn_sweep_task(pending.clone(), Duration::from_secs(15), stop_rx);
/// // Later, during shutdown:
/// stop_tx.send(true).ok();
/// handle.await.ok();
/// ```
pub fn spawn_sweep_task<R>(
    pending: SharedPending<R>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting callback sweep task with interval of {}ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = lock_pending(&pending).remove_expired(Instant::now());

                    if removed > 0 {
                        info!("Callback sweep: removed {} expired results", removed);
                    } else {
                        debug!("Callback sweep: no expired results found");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        debug!("Callback sweep task stopped");
    })
}
