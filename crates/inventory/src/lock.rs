//! Per-room exclusive locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::RoomId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per room.
///
/// Mutexes are created lazily on first use and never removed, so two callers
/// locking the same room always contend on the same mutex. Rooms are locked
/// independently of each other.
#[derive(Clone, Default)]
pub struct RoomLocks {
    locks: Arc<Mutex<HashMap<RoomId, Arc<AsyncMutex<()>>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a room.
    ///
    /// The room stays locked until the returned guard is dropped.
    pub async fn acquire(&self, room_id: RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(room_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Returns the number of rooms that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
