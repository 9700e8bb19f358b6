//! Per-conversation write serialization
//!
//! Two requests against the same conversation run their store writes one
//! after the other; requests for different conversations never wait on each
//! other. Entries are dropped from the map once no guard or waiter holds them.

use sdk::ConversationId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug)]
struct Entry {
    lock: Arc<tokio::sync::Mutex<()>>,
    /// Holders plus waiters
    users: usize,
}

type LockMap = HashMap<ConversationId, Entry>;

#[derive(Debug, Clone, Default)]
pub struct ConversationLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// A slot in the map, released on drop whether or not the lock was obtained
struct Registration {
    id: ConversationId,
    map: Arc<Mutex<LockMap>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = map.get_mut(&self.id) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                map.remove(&self.id);
            }
        }
    }
}

/// Held for the duration of a write sequence
pub struct ConversationGuard {
    // Fields drop in order: the lock is released before the slot
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the conversation's lock. Dropping the returned future
    /// before it completes gives up the slot.
    pub async fn acquire(&self, id: &ConversationId) -> ConversationGuard {
        let (lock, registration) = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = map.entry(id.clone()).or_insert_with(|| Entry {
                lock: Arc::default(),
                users: 0,
            });
            entry.users += 1;
            (
                Arc::clone(&entry.lock),
                Registration {
                    id: id.clone(),
                    map: Arc::clone(&self.inner),
                },
            )
        };

        let guard = lock.lock_owned().await;
        ConversationGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of conversations with a live lock entry
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
