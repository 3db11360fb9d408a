//! Callback Correlator
//!
//! Hands delivered results to callers blocked on the same sync id, buffering
//! them for a bounded time when nobody is waiting yet.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use super::pending::{lock_pending, PendingState, SharedPending};
use super::CallbackResult;
use crate::error::CallbackError;
use crate::tasks::{spawn_sweep_task, sweep_interval};

// == Correlator ==
/// Matches asynchronously delivered results to waiting callers.
///
/// `store_duration` is both how long an unclaimed result stays buffered and
/// how long [`await_result`](Self::await_result) waits before giving up.
/// Must be created inside a Tokio runtime, since it spawns its sweep task.
#[derive(Debug)]
pub struct Correlator<R: CallbackResult> {
    pending: SharedPending<R>,
    store_duration: Duration,
    shutdown: watch::Sender<bool>,
    sweep_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R: CallbackResult> Correlator<R> {
    // == Constructor ==
    /// Creates a correlator and starts its sweep task.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(store_duration: Duration) -> Self {
        let pending: SharedPending<R> = Arc::new(Mutex::new(PendingState::default()));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = spawn_sweep_task(
            pending.clone(),
            sweep_interval(store_duration),
            shutdown_rx,
        );

        Self {
            pending,
            store_duration,
            shutdown,
            sweep_handle: Mutex::new(Some(handle)),
        }
    }

    /// Returns the configured store duration.
    pub fn store_duration(&self) -> Duration {
        self.store_duration
    }

    // == Deliver ==
    /// Reports a result delivered by the platform.
    ///
    /// A registered waiter receives it directly; otherwise it is buffered
    /// for the store duration, replacing any earlier result for the same id.
    pub fn deliver(&self, result: R) {
        let sync_id = result.sync_id();
        let mut pending = self.lock();

        let result = match pending.take_waiter(&sync_id) {
            Some(tx) => match tx.send(result) {
                Ok(()) => {
                    debug!(%sync_id, "Callback handed to waiter");
                    return;
                }
                // Waiter went away between registration and delivery
                Err(result) => result,
            },
            None => result,
        };

        debug!(%sync_id, "Callback buffered");
        pending.buffer(sync_id, result, Instant::now() + self.store_duration);
    }

    // == Await Result ==
    /// Waits for the result of `sync_id`.
    ///
    /// Returns a buffered result immediately if one exists. Otherwise
    /// registers a waiter and suspends until delivery or until the store
    /// duration elapses. A result whose status is not a success comes back
    /// as [`CallbackError::Failed`]. Dropping the returned future removes
    /// the registration.
    pub async fn await_result(&self, sync_id: Uuid) -> Result<R, CallbackError<R>> {
        let (token, mut rx) = {
            let mut pending = self.lock();

            if let Some(result) = pending.take_buffered(&sync_id) {
                debug!(%sync_id, "Callback was already buffered");
                return into_outcome(sync_id, result);
            }
            if pending.has_waiter(&sync_id) {
                return Err(CallbackError::AlreadyAwaited(sync_id));
            }

            let (tx, rx) = oneshot::channel();
            (pending.register_waiter(sync_id, tx), rx)
        };
        let _registration = Registration {
            pending: &self.pending,
            sync_id,
            token,
        };

        match tokio::time::timeout(self.store_duration, &mut rx).await {
            Ok(Ok(result)) => into_outcome(sync_id, result),
            Ok(Err(_)) => Err(CallbackError::Timeout(sync_id)),
            Err(_) => {
                self.lock().remove_waiter(&sync_id, token);
                // A delivery may have taken the waiter just before removal
                match rx.try_recv() {
                    Ok(result) => into_outcome(sync_id, result),
                    Err(_) => {
                        debug!(%sync_id, "Timed out waiting for callback");
                        Err(CallbackError::Timeout(sync_id))
                    }
                }
            }
        }
    }

    // == Stop ==
    /// Stops the sweep task and waits until it has exited.
    ///
    /// In-flight awaits are not cancelled. Calling this twice is a no-op.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);

        let handle = self
            .sweep_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!("Callback sweep task ended abnormally: {}", err);
            }
        }
    }

    /// Number of delivered results nobody has claimed yet.
    pub fn buffered_len(&self) -> usize {
        self.lock().buffered_len()
    }

    /// Number of callers currently waiting.
    pub fn waiting_len(&self) -> usize {
        self.lock().waiting_len()
    }

    fn lock(&self) -> MutexGuard<'_, PendingState<R>> {
        lock_pending(&self.pending)
    }
}

/// Translates a delivered result into the caller-facing outcome.
fn into_outcome<R: CallbackResult>(sync_id: Uuid, result: R) -> Result<R, CallbackError<R>> {
    match result.failure_reason() {
        Some(reason) => Err(CallbackError::Failed {
            sync_id,
            reason,
            result: Box::new(result),
        }),
        None => Ok(result),
    }
}

// == Registration ==
/// Removes a waiter registration when its await finishes or is dropped.
struct Registration<'a, R> {
    pending: &'a Mutex<PendingState<R>>,
    sync_id: Uuid,
    token: u64,
}

impl<R> Drop for Registration<'_, R> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove_waiter(&self.sync_id, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct TestResult {
        id: Uuid,
        status: &'static str,
    }

    impl TestResult {
        fn ok(id: Uuid) -> Self {
            Self { id, status: "ok" }
        }
    }

    impl CallbackResult for TestResult {
        fn sync_id(&self) -> Uuid {
            self.id
        }

        fn failure_reason(&self) -> Option<String> {
            (self.status != "ok").then(|| self.status.to_string())
        }
    }

    const STORE: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn test_deliver_then_await_returns_buffered_result() {
        let correlator = Correlator::new(STORE);
        let id = Uuid::new_v4();

        correlator.deliver(TestResult::ok(id));
        assert_eq!(correlator.buffered_len(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;

        let started = Instant::now();
        let result = correlator.await_result(id).await.unwrap();
        assert_eq!(result, TestResult::ok(id));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(correlator.buffered_len(), 0);

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_then_deliver_hands_off_directly() {
        let correlator = Arc::new(Correlator::new(STORE));
        let id = Uuid::new_v4();

        let waiter = {
            let correlator = correlator.clone();
            tokio::spawn(async move { correlator.await_result(id).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(correlator.waiting_len(), 1);

        correlator.deliver(TestResult::ok(id));

        let result = waiter.await.unwrap().unwrap();
        assert_eq!(result.id, id);
        assert_eq!(correlator.waiting_len(), 0);
        assert_eq!(correlator.buffered_len(), 0);

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_times_out_after_store_duration() {
        let correlator: Correlator<TestResult> = Correlator::new(STORE);
        let id = Uuid::new_v4();

        let started = Instant::now();
        let err = correlator.await_result(id).await.unwrap_err();

        assert!(err.is_timeout());
        let elapsed = started.elapsed();
        assert!(elapsed >= STORE && elapsed <= STORE + Duration::from_millis(50));
        assert_eq!(correlator.waiting_len(), 0);

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_delivery_after_timeout_is_buffered() {
        let correlator = Correlator::new(Duration::from_millis(200));
        let id = Uuid::new_v4();

        assert!(correlator.await_result(id).await.unwrap_err().is_timeout());

        correlator.deliver(TestResult::ok(id));
        assert_eq!(correlator.buffered_len(), 1);
        assert_eq!(correlator.await_result(id).await.unwrap().id, id);

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_status_is_reported_with_result() {
        let correlator = Correlator::new(STORE);
        let id = Uuid::new_v4();

        correlator.deliver(TestResult {
            id,
            status: "error",
        });

        match correlator.await_result(id).await {
            Err(CallbackError::Failed {
                sync_id,
                reason,
                result,
            }) => {
                assert_eq!(sync_id, id);
                assert_eq!(reason, "error");
                assert_eq!(result.id, id);
            }
            other => panic!("expected failure, got {:?}", other),
        }

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_waiter_for_same_id_is_rejected() {
        let correlator = Arc::new(Correlator::new(STORE));
        let id = Uuid::new_v4();

        let first = {
            let correlator = correlator.clone();
            tokio::spawn(async move { correlator.await_result(id).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = correlator.await_result(id).await;
        assert!(matches!(second, Err(CallbackError::AlreadyAwaited(got)) if got == id));

        correlator.deliver(TestResult::ok(id));
        assert!(first.await.unwrap().is_ok());

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_await_falls_back_to_buffer() {
        let correlator = Correlator::new(STORE);
        let id = Uuid::new_v4();

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), correlator.await_result(id)).await;
        assert!(cancelled.is_err());
        assert_eq!(correlator.waiting_len(), 0);

        correlator.deliver(TestResult::ok(id));
        assert_eq!(correlator.buffered_len(), 1);

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_clears_unclaimed_results() {
        let correlator = Correlator::new(Duration::from_millis(100));

        for _ in 0..10 {
            correlator.deliver(TestResult::ok(Uuid::new_v4()));
        }
        assert_eq!(correlator.buffered_len(), 10);

        // Two sweep intervals past expiry
        let store = correlator.store_duration();
        tokio::time::sleep(store + 2 * sweep_interval(store)).await;

        assert_eq!(correlator.buffered_len(), 0);

        correlator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_leaves_waiters_alone() {
        let correlator = Arc::new(Correlator::new(Duration::from_millis(100)));
        let id = Uuid::new_v4();

        let waiter = {
            let correlator = correlator.clone();
            tokio::spawn(async move { correlator.await_result(id).await })
        };

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(correlator.waiting_len(), 1);

        correlator.deliver(TestResult::ok(id));
        assert!(waiter.await.unwrap().is_ok());

        correlator.stop().await;
    }

    #[tokio::test]
    async fn test_no_lost_delivery_under_concurrency() {
        let correlator = Arc::new(Correlator::new(Duration::from_secs(5)));
        let ids: Vec<Uuid> = (0..200).map(|_| Uuid::new_v4()).collect();

        let mut tasks = Vec::new();
        for (i, id) in ids.iter().copied().enumerate() {
            let waiter = correlator.clone();
            let deliverer = correlator.clone();
            if i % 2 == 0 {
                tasks.push(tokio::spawn(async move { waiter.await_result(id).await }));
                tokio::spawn(async move { deliverer.deliver(TestResult::ok(id)) });
            } else {
                tokio::spawn(async move { deliverer.deliver(TestResult::ok(id)) });
                tasks.push(tokio::spawn(async move { waiter.await_result(id).await }));
            }
        }

        for (task, id) in tasks.into_iter().zip(ids) {
            assert_eq!(task.await.unwrap().unwrap().id, id);
        }
        assert_eq!(correlator.waiting_len(), 0);
        assert_eq!(correlator.buffered_len(), 0);

        correlator.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let correlator: Correlator<TestResult> = Correlator::new(STORE);

        correlator.stop().await;
        correlator.stop().await;

        // Still usable for buffering and awaiting after stop
        let id = Uuid::new_v4();
        correlator.deliver(TestResult::ok(id));
        assert!(correlator.await_result(id).await.is_ok());
    }
}
