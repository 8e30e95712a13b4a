// src/supervisor/cancel.rs

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Cancellation flag shared by every thread of one job.
///
/// Setting it wakes all threads blocked in [`CancelToken::sleep`] or
/// [`CancelToken::wait`], which is how a job's threads are "interrupted".
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    pair: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.pair;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.pair;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` unless cancelled first. Returns `true` when the
    /// sleep was cut short (or the token was already cancelled).
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let (lock, cvar) = &*self.pair;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Block until cancelled.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.pair;
        let cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = cvar
            .wait_while(cancelled, |c| !*c)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
