//! Auto-expiring keyed slots
//!
//! Backs transient UI state such as "recently copied" flags and the error
//! banner. Each insert schedules a cancellable expiry task; the entry
//! disappears when the task fires, without anyone having to read it first.
//! Clearing or dropping the owner cancels every pending expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

struct Slot<V> {
    value: V,
    generation: u64,
    deadline: Instant,
}

type SlotMap<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

/// Map whose entries remove themselves after a time-to-live
pub struct ExpiringSlots<K, V> {
    slots: SlotMap<K, V>,
    timers: HashMap<K, JoinHandle<()>>,
    next_generation: u64,
}

impl<K, V> Default for ExpiringSlots<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ExpiringSlots<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            timers: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Set `key` to `value` for `ttl`, restarting any window already running
    ///
    /// Must be called from within a Tokio runtime.
    pub fn insert(&mut self, key: K, value: V, ttl: Duration) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let deadline = Instant::now() + ttl;
        debug!(generation, ?ttl, "ExpiringSlots::insert: called");

        lock(&self.slots).insert(
            key.clone(),
            Slot {
                value,
                generation,
                deadline,
            },
        );

        self.timers.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = self.timers.remove(&key) {
            previous.abort();
        }

        let slots = self.slots.clone();
        let expiring_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut slots = lock(&slots);
            if slots.get(&expiring_key).is_some_and(|slot| slot.generation == generation) {
                slots.remove(&expiring_key);
                debug!(generation, "ExpiringSlots: entry expired");
            }
        });
        self.timers.insert(key, timer);
    }

    pub fn contains(&self, key: &K) -> bool {
        lock(&self.slots)
            .get(key)
            .is_some_and(|slot| slot.deadline > Instant::now())
    }

    /// Remove `key` now and cancel its expiry
    pub fn remove(&mut self, key: &K) {
        lock(&self.slots).remove(key);
        if let Some(timer) = self.timers.remove(key) {
            timer.abort();
        }
    }

    /// Remove everything and cancel all pending expiries
    pub fn clear(&mut self) {
        debug!(pending = self.timers.len(), "ExpiringSlots::clear: called");
        lock(&self.slots).clear();
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        lock(&self.slots).values().filter(|slot| slot.deadline > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> ExpiringSlots<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn get(&self, key: &K) -> Option<V> {
        lock(&self.slots)
            .get(key)
            .filter(|slot| slot.deadline > Instant::now())
            .map(|slot| slot.value.clone())
    }
}

impl<K, V> Drop for ExpiringSlots<K, V> {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

fn lock<K, V>(slots: &SlotMap<K, V>) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
