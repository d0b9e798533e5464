//! Ref-counted ownership of provider sessions.
//!
//! A [`SessionLease`] wraps exactly one boxed
//! [`ProviderSession`](crate::provider::ProviderSession) with a reference
//! count starting at 1. Models hold leases; the session's `dispose` runs
//! exactly once, synchronously, when the last lease releases. Count
//! mutations are single mutex-guarded steps with no suspension inside, and
//! the count can never go negative.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::provider::ProviderSession;

pub(crate) struct SessionLease {
    shared: Arc<Mutex<LeaseState>>,
}

struct LeaseState {
    refs: u32,
    session: Option<Box<dyn ProviderSession>>,
}

impl SessionLease {
    /// Wraps a fresh provider session with a count of 1.
    pub(crate) fn new(session: Box<dyn ProviderSession>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(LeaseState {
                refs: 1,
                session: Some(session),
            })),
        }
    }

    /// Increments the count and returns another lease over the same
    /// session, or `None` when the session is already gone.
    pub(crate) fn acquire(&self) -> Option<Self> {
        let mut state = self.lock();
        if state.session.is_none() {
            return None;
        }
        state.refs += 1;
        drop(state);
        Some(Self {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Decrements the count; at zero, disposes the session exactly once.
    ///
    /// The session's own `dispose` runs outside the lock: provider teardown
    /// is foreign code and must not execute under this lease's mutex.
    pub(crate) fn release(&self) {
        let mut state = self.lock();
        state.refs = state.refs.saturating_sub(1);
        if state.refs > 0 {
            return;
        }
        let session = state.session.take();
        drop(state);
        if let Some(mut session) = session {
            session.dispose();
        }
    }

    #[cfg(test)]
    pub(crate) fn refs(&self) -> u32 {
        self.lock().refs
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.lock().session.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, LeaseState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
