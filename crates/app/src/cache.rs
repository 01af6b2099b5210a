//! In-memory TTL caches shared across requests.
//!
//! Locks are only held while reading or writing a slot, never across an
//! upstream call, so two concurrent refreshes of an expired entry may both
//! reach the upstream.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Slot<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.stored_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A single cached value.
#[derive(Debug)]
pub struct TtlCell<T> {
    ttl: Duration,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T: Clone> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn fresh(&self) -> Option<T> {
        lock(&self.slot).as_ref().and_then(|slot| slot.fresh(self.ttl))
    }

    /// The last stored value regardless of age.
    pub fn stale(&self) -> Option<T> {
        lock(&self.slot).as_ref().map(|slot| slot.value.clone())
    }

    pub fn store(&self, value: T) {
        *lock(&self.slot) = Some(Slot::new(value));
    }
}

/// Cached values keyed by request parameters, holding at most `capacity`
/// entries.
#[derive(Debug)]
pub struct TtlMap<K, T> {
    ttl: Duration,
    capacity: usize,
    slots: Mutex<HashMap<K, Slot<T>>>,
}

impl<K: Eq + Hash + Clone, T: Clone> TtlMap<K, T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn fresh(&self, key: &K) -> Option<T> {
        lock(&self.slots)
            .get(key)
            .and_then(|slot| slot.fresh(self.ttl))
    }

    /// Stores `value` and drops every expired entry. When the map is full the
    /// oldest entry makes room.
    pub fn store(&self, key: K, value: T) {
        let mut slots = lock(&self.slots);
        slots.retain(|_, slot| slot.stored_at.elapsed() < self.ttl);
        while slots.len() >= self.capacity && !slots.contains_key(&key) {
            let Some(oldest) = slots
                .iter()
                .min_by_key(|(_, slot)| slot.stored_at)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            slots.remove(&oldest);
        }
        slots.insert(key, Slot::new(value));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock(&self.slots).len()
    }
}
