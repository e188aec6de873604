//! Cancellation for blocked waits
//!
//! A [`CancelToken`] is created by the space it will be used with. Cancelling
//! sets a flag and then broadcasts on that space's condvar while holding the
//! store lock, so a waiter that read the flag as unset under the lock is
//! guaranteed to be parked (and woken) before the broadcast happens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::store::Shared;

/// Abort handle for one caller's blocking `rd`/`in`
///
/// Cloning shares the flag. Cancelling never touches resident tuples.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    space: Weak<Shared>,
}

impl CancelToken {
    pub(crate) fn new(space: Weak<Shared>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            space,
        }
    }

    /// Cancel the wait; a blocked call returns `SpaceError::Cancelled`
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);

        // Space already dropped: nobody can be waiting on it
        if let Some(shared) = self.space.upgrade() {
            let _state = shared.state.lock();
            shared.changed.notify_all();
        }
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether this token was issued by the space owning `shared`
    pub(crate) fn belongs_to(&self, shared: &Arc<Shared>) -> bool {
        std::ptr::eq(self.space.as_ptr(), Arc::as_ptr(shared))
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
