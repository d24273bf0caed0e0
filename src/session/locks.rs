use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<i64, Arc<Mutex<()>>>;

/// Per-user mutual exclusion.
///
/// Events of one user are handled one at a time and in arrival order
/// (tokio mutexes are fair); different users never wait for each other.
/// An entry lives only while some event of that user holds or awaits it.
#[derive(Clone, Default)]
pub struct UserLocks {
    locks: Arc<LockMap>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `user_id` is free and holds it until the guard drops.
    pub async fn acquire(&self, user_id: i64) -> UserGuard {
        // Clone the Arc out so the shard lock is released before awaiting
        let lock = self.locks.entry(user_id).or_default().clone();
        let guard = lock.clone().lock_owned().await;
        UserGuard {
            user_id,
            lock,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Number of users with an event in flight.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while one event of a user is processed.
pub struct UserGuard {
    user_id: i64,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Two owners left (the map and `self.lock`) means nobody is queued.
        // `acquire` clones under the same shard lock, so this cannot race it.
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);
    }
}
