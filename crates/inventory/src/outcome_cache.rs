//! Idempotency record of `confirm` outcomes.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use common::{AvailabilityConfirmation, RequestId};
use lru::LruCache;

/// Default number of outcomes retained.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Sizing of the outcome cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeCacheConfig {
    /// Maximum number of request IDs remembered. Least recently used entries
    /// are evicted first. A capacity of zero is treated as one.
    pub capacity: usize,
    /// How long an outcome stays valid. `None` keeps entries until evicted.
    pub ttl: Option<Duration>,
}

impl Default for OutcomeCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: None,
        }
    }
}

struct Entry {
    outcome: AvailabilityConfirmation,
    stored_at: Instant,
}

/// Bounded map from request ID to the outcome of its `confirm` call.
///
/// Safe to share across tasks; every operation takes a short internal lock
/// that is never held across an await.
pub struct OutcomeCache {
    entries: Mutex<LruCache<RequestId, Entry>>,
    ttl: Option<Duration>,
}

impl OutcomeCache {
    pub fn new(config: OutcomeCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
        }
    }

    /// Returns the cached outcome for a request, dropping it if it expired.
    pub fn get(&self, request_id: &RequestId) -> Option<AvailabilityConfirmation> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match entries.get(request_id) {
            None => return None,
            Some(entry) => self.is_expired(entry),
        };
        if expired {
            entries.pop(request_id);
            return None;
        }
        entries.get(request_id).map(|entry| entry.outcome.clone())
    }

    /// Records the outcome of a request.
    pub fn insert(&self, request_id: RequestId, outcome: AvailabilityConfirmation) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(
                request_id,
                Entry {
                    outcome,
                    stored_at: Instant::now(),
                },
            );
    }

    /// Forgets the outcome of a request.
    pub fn remove(&self, request_id: &RequestId) -> Option<AvailabilityConfirmation> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(request_id)
            .map(|entry| entry.outcome)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.ttl.is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

impl Default for OutcomeCache {
    fn default() -> Self {
        Self::new(OutcomeCacheConfig::default())
    }
}
