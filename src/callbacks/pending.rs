//! Pending Correlations
//!
//! Shared state behind a [`Correlator`](super::Correlator): registered
//! waiters and buffered results, keyed by sync id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// Pending state shared between a correlator and its sweep task.
pub type SharedPending<R> = Arc<Mutex<PendingState<R>>>;

/// Locks the pending state, recovering from poisoning.
///
/// Every mutation is a single map operation, so a panic elsewhere while the
/// lock was held cannot leave the maps inconsistent.
pub fn lock_pending<R>(pending: &Mutex<PendingState<R>>) -> MutexGuard<'_, PendingState<R>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Waiter ==
/// A caller blocked on one sync id.
#[derive(Debug)]
struct Waiter<R> {
    /// Distinguishes successive registrations of the same id
    token: u64,
    tx: oneshot::Sender<R>,
}

// == Buffered Result ==
/// A delivered result nobody was waiting for yet.
#[derive(Debug)]
struct BufferedResult<R> {
    result: R,
    expires_at: Instant,
}

// == Pending State ==
/// Waiter and buffered-result maps.
///
/// For any sync id at most one of the two maps holds an entry.
#[derive(Debug)]
pub struct PendingState<R> {
    waiters: HashMap<Uuid, Waiter<R>>,
    buffered: HashMap<Uuid, BufferedResult<R>>,
    next_token: u64,
}

impl<R> Default for PendingState<R> {
    fn default() -> Self {
        Self {
            waiters: HashMap::new(),
            buffered: HashMap::new(),
            next_token: 0,
        }
    }
}

impl<R> PendingState<R> {
    /// Removes and returns the buffered result for `sync_id`, if any.
    ///
    /// A buffered result past its expiry but not yet swept is still returned.
    pub fn take_buffered(&mut self, sync_id: &Uuid) -> Option<R> {
        self.buffered.remove(sync_id).map(|b| b.result)
    }

    /// Stores a result, replacing any earlier one for the same id.
    pub fn buffer(&mut self, sync_id: Uuid, result: R, expires_at: Instant) {
        self.buffered
            .insert(sync_id, BufferedResult { result, expires_at });
    }

    pub fn has_waiter(&self, sync_id: &Uuid) -> bool {
        self.waiters.contains_key(sync_id)
    }

    /// Registers a waiter and returns its token.
    pub fn register_waiter(&mut self, sync_id: Uuid, tx: oneshot::Sender<R>) -> u64 {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.waiters.insert(sync_id, Waiter { token, tx });
        token
    }

    /// Takes the waiter's sender for `sync_id`, if one is registered.
    pub fn take_waiter(&mut self, sync_id: &Uuid) -> Option<oneshot::Sender<R>> {
        self.waiters.remove(sync_id).map(|w| w.tx)
    }

    /// Removes the waiter for `sync_id` only if it is the registration
    /// identified by `token`. Returns whether anything was removed.
    pub fn remove_waiter(&mut self, sync_id: &Uuid, token: u64) -> bool {
        match self.waiters.get(sync_id) {
            Some(waiter) if waiter.token == token => {
                self.waiters.remove(sync_id);
                true
            }
            _ => false,
        }
    }

    /// Drops buffered results whose expiry is before `now`.
    pub fn remove_expired(&mut self, now: Instant) -> usize {
        let before = self.buffered.len();
        self.buffered.retain(|_, b| b.expires_at > now);
        before - self.buffered.len()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    pub fn waiting_len(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_buffer_overwrites_previous_result() {
        let mut state = PendingState::default();
        let id = Uuid::new_v4();
        let exp = Instant::now() + Duration::from_secs(30);

        state.buffer(id, "first", exp);
        state.buffer(id, "second", exp);

        assert_eq!(state.buffered_len(), 1);
        assert_eq!(state.take_buffered(&id), Some("second"));
        assert_eq!(state.take_buffered(&id), None);
    }

    #[test]
    fn test_remove_waiter_checks_token() {
        let mut state: PendingState<u32> = PendingState::default();
        let id = Uuid::new_v4();

        let (tx1, _rx1) = oneshot::channel();
        let old = state.register_waiter(id, tx1);
        let (tx2, _rx2) = oneshot::channel();
        let current = state.register_waiter(id, tx2);

        assert!(!state.remove_waiter(&id, old));
        assert!(state.has_waiter(&id));
        assert!(state.remove_waiter(&id, current));
        assert_eq!(state.waiting_len(), 0);
    }

    #[test]
    fn test_remove_expired_keeps_live_results() {
        let mut state = PendingState::default();
        let now = Instant::now();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();

        state.buffer(stale, 1, now - Duration::from_millis(1));
        state.buffer(live, 2, now + Duration::from_secs(30));

        assert_eq!(state.remove_expired(now), 1);
        assert_eq!(state.take_buffered(&live), Some(2));
        assert_eq!(state.take_buffered(&stale), None);
    }
}
