//! Cooperative stop signal.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Shared flag that asks the poll loop to stop.
///
/// Clones share state. [`StopSignal::wait_timeout`] returns as soon as a
/// stop is requested, so a long interval never delays shutdown.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop and wakes any waiter.
    pub fn request_stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for up to `timeout`. Returns `true` if a stop was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Past the end of the clock: only a stop ends the wait
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while !*stopped {
                stopped = cvar.wait(stopped).unwrap_or_else(PoisonError::into_inner);
            }
            return true;
        };

        // Loop to absorb spurious wakeups
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            stopped = cvar
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *stopped
    }
}
