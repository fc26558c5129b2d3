//! Per-session turn serialization.
//!
//! Two turns on the same session would otherwise both load the chat, both
//! append, and the later save would drop the earlier turn. [`SessionLocks`]
//! hands out one async lock per [`ChatId`]; entries are pruned once no
//! task holds or waits on them.

use chat_service_domain::ChatId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<ChatId, Arc<AsyncMutex<()>>>;

/// Registry of per-session locks.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held for the duration of one turn.
pub struct SessionGuard {
    // Field order matters: the lock is released before the entry is pruned.
    _guard: OwnedMutexGuard<()>,
    _prune: PruneOnDrop,
}

/// Removes the session's entry once nothing else references its lock.
///
/// Lives in the waiting future too, so an acquire that is dropped before
/// it gets the lock still cleans up after itself.
struct PruneOnDrop {
    id: ChatId,
    locks: Arc<Mutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn runs on `id`, then claim it.
    pub async fn acquire(&self, id: &ChatId) -> SessionGuard {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(id.clone()).or_default().clone()
        };
        let prune = PruneOnDrop {
            id: id.clone(),
            locks: Arc::clone(&self.inner),
        };
        let guard = lock.lock_owned().await;
        SessionGuard {
            _guard: guard,
            _prune: prune,
        }
    }

    /// Number of sessions with a live lock entry.
    pub fn active_sessions(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for PruneOnDrop {
    fn drop(&mut self) {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map's own reference left: nobody is waiting.
        if let Some(lock) = map.get(&self.id)
            && Arc::strong_count(lock) == 1
        {
            map.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_is_pruned_after_release() {
        let locks = SessionLocks::new();
        let guard = locks.acquire(&ChatId::new("s1")).await;
        assert_eq!(locks.active_sessions(), 1);
        drop(guard);
        assert_eq!(locks.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_same_session_is_serialized() {
        let locks = SessionLocks::new();
        let id = ChatId::new("s1");
        let first = locks.acquire(&id).await;

        let waiter = {
            let locks = locks.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_distinct_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(&ChatId::new("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&ChatId::new("b")))
            .await;
        assert!(b.is_ok());
        assert_eq!(locks.active_sessions(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_does_not_leak_entry() {
        let locks = SessionLocks::new();
        let id = ChatId::new("s1");
        let holder = locks.acquire(&id).await;

        let waiter = {
            let locks = locks.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Holder leaves while the waiter is still parked, then the waiter goes away.
        drop(holder);
        assert_eq!(locks.active_sessions(), 1);
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        assert_eq!(locks.active_sessions(), 0);
    }
}
