//! Bounded session store.
//!
//! Sessions are registered in insertion order and evicted oldest-first
//! when the store grows past its capacity. Lookup does not refresh a
//! session's position: this is a FIFO bound, not an LRU.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::HierarchyModel;
use crate::token::TokenGenerator;
use crate::types::SessionId;

/// Sessions retained before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 10;

/// Store tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of live sessions. A zero capacity is clamped to 1
    /// so an insert cannot evict the entry it just added.
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Registry of live hierarchy sessions, bounded by capacity.
///
/// The store owns token issuance so a freshly minted token can be checked
/// against the ids still registered. All methods take `&self`; the store
/// is shared behind an [`Arc`] by whatever owns it.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    tokens: TokenGenerator,
    capacity: usize,
}

struct StoreInner {
    sessions: HashMap<SessionId, Arc<HierarchyModel>>,
    order: VecDeque<SessionId>,
}

impl SessionStore {
    /// Store with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Store with explicit tuning.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                order: VecDeque::new(),
            }),
            tokens: TokenGenerator::new(),
            capacity: config.capacity.max(1),
        }
    }

    /// Maximum number of sessions retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mints a session token distinct from every registered session.
    #[must_use]
    pub fn issue_token(&self) -> SessionId {
        let inner = self.lock();
        self.tokens.next(|candidate| inner.sessions.contains_key(candidate))
    }

    /// Registers `model`, evicting oldest sessions past capacity.
    ///
    /// Evicted sessions are disposed after the store lock is released so
    /// provider teardown never runs under it.
    pub fn insert(&self, model: HierarchyModel) -> Arc<HierarchyModel> {
        let model = Arc::new(model);
        let mut evicted = Vec::new();
        {
            let mut inner = self.lock();
            let id = model.id().clone();
            if let Some(previous) = inner.sessions.insert(id.clone(), Arc::clone(&model)) {
                // Token reuse should be impossible while the holder is
                // registered; replace the stale entry rather than keep two
                // orders for one id.
                warn!(session = %id, "replacing session registered under a reused token");
                inner.order.retain(|queued| queued != &id);
                evicted.push(previous);
            }
            inner.order.push_back(id);
            while inner.sessions.len() > self.capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                if let Some(old) = inner.sessions.remove(&oldest) {
                    evicted.push(old);
                }
            }
        }
        for old in evicted {
            debug!(session = %old.id(), "evicting oldest hierarchy session");
            if old.dispose().is_err() {
                warn!(session = %old.id(), "evicted session was already disposed");
            }
        }
        model
    }

    /// Looks up a live session. Does not refresh its eviction position.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<Arc<HierarchyModel>> {
        self.lock().sessions.get(id).cloned()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().sessions.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // Sessions and order stay consistent even if a holder panicked
        // mid-update elsewhere; recover the data instead of poisoning
        // every later request.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
