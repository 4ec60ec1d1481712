use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use super::entry::CachedEntry;
use super::key::{KeyFamily, QueryKey};

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Key-addressed cache of API projections with per-key subscribers.
///
/// All operations are synchronous and take a short internal lock that is
/// never held while subscriber callbacks run, so a callback may call back
/// into the store.
#[derive(Default)]
pub struct CacheStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    entries: HashMap<QueryKey, CachedEntry>,
    /// Bumped on every invalidation of the key
    generations: HashMap<QueryKey, u64>,
    /// Bumped on every wildcard invalidation of the family
    family_generations: HashMap<KeyFamily, u64>,
    /// Generation the current entry was fetched at
    written: HashMap<QueryKey, u64>,
    /// Bumped by `reset`; fetches started before it are discarded
    epoch: u64,
    subscribers: HashMap<QueryKey, BTreeMap<u64, Callback>>,
    next_subscriber: u64,
}

impl StoreInner {
    fn generation(&self, key: &QueryKey) -> u64 {
        let own = self.generations.get(key).copied().unwrap_or(0);
        let family = key
            .family()
            .and_then(|f| self.family_generations.get(&f).copied())
            .unwrap_or(0);
        own + family
    }

    fn callbacks(&self, key: &QueryKey) -> Vec<Callback> {
        self.subscribers
            .get(key)
            .map(|subs| subs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Flag the entry stale; true only if it was fresh before.
    fn mark_stale(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.stale => {
                entry.stale = true;
                true
            }
            _ => false,
        }
    }
}

/// Snapshot of a key's invalidation state taken when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    epoch: u64,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &QueryKey) -> Option<CachedEntry> {
        self.lock().entries.get(key).cloned()
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock().entries.get(key).map(|e| e.stale).unwrap_or(false)
    }

    /// Every cached entry, ordered by key.
    pub fn snapshot(&self) -> Vec<(QueryKey, CachedEntry)> {
        let inner = self.lock();
        let mut entries: Vec<_> = inner
            .entries
            .iter()
            .map(|(k, e)| (*k, e.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store fresh data for `key` and notify its subscribers.
    pub fn set(&self, key: QueryKey, data: Value) {
        let callbacks = {
            let mut inner = self.lock();
            let generation = inner.generation(&key);
            inner.written.insert(key, generation);
            inner.entries.insert(key, CachedEntry::new(data.clone()));
            inner.callbacks(&key)
        };
        debug!(key = %key, subscribers = callbacks.len(), "cache set");
        for callback in callbacks {
            callback(&data);
        }
    }

    /// Flag `key` stale, keeping its data servable.
    ///
    /// Returns false when there was nothing fresh to invalidate. The key's
    /// generation advances either way so an in-flight fetch lands stale.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut inner = self.lock();
        *inner.generations.entry(*key).or_insert(0) += 1;
        let changed = inner.mark_stale(key);
        if changed {
            debug!(key = %key, "cache entry invalidated");
        } else {
            trace!(key = %key, "invalidation was a no-op");
        }
        changed
    }

    /// Flag every key of `family` stale, including ones not cached yet.
    ///
    /// Returns the keys that went from fresh to stale.
    pub fn invalidate_family(&self, family: KeyFamily) -> Vec<QueryKey> {
        let mut inner = self.lock();
        *inner.family_generations.entry(family).or_insert(0) += 1;
        let members: Vec<QueryKey> = inner
            .entries
            .keys()
            .filter(|k| k.family() == Some(family))
            .copied()
            .collect();
        let mut changed: Vec<QueryKey> = members
            .into_iter()
            .filter(|k| inner.mark_stale(k))
            .collect();
        changed.sort();
        debug!(family = %family, invalidated = changed.len(), "cache family invalidated");
        changed
    }

    pub fn fetch_ticket(&self, key: &QueryKey) -> FetchTicket {
        let inner = self.lock();
        FetchTicket {
            generation: inner.generation(key),
            epoch: inner.epoch,
        }
    }

    /// True when nothing invalidated `key` since `ticket` was taken.
    pub fn is_current(&self, key: &QueryKey, ticket: FetchTicket) -> bool {
        let inner = self.lock();
        ticket.epoch == inner.epoch && ticket.generation == inner.generation(key)
    }

    /// Write the result of a fetch started with `ticket`.
    ///
    /// The entry stays stale if `key` was invalidated while the fetch was
    /// running. Results from before a `reset`, or older than the data
    /// already cached, are dropped. Returns whether anything was written.
    pub fn complete_fetch(&self, key: QueryKey, data: Value, ticket: FetchTicket) -> bool {
        let callbacks = {
            let mut inner = self.lock();
            if ticket.epoch != inner.epoch {
                debug!(key = %key, "discarding fetch from before cache reset");
                return false;
            }
            if let Some(&written) = inner.written.get(&key) {
                if ticket.generation < written {
                    debug!(key = %key, "discarding fetch older than cached data");
                    return false;
                }
            }
            let outdated = ticket.generation != inner.generation(&key);
            let mut entry = CachedEntry::new(data.clone());
            entry.stale = outdated;
            inner.written.insert(key, ticket.generation);
            inner.entries.insert(key, entry);
            if outdated {
                debug!(key = %key, "fetch landed after invalidation, entry stays stale");
            }
            inner.callbacks(&key)
        };
        for callback in callbacks {
            callback(&data);
        }
        true
    }

    /// Register `callback` for every `set` of `key`.
    ///
    /// The callback runs on whatever thread writes the key. Dropping the
    /// returned handle unsubscribes.
    pub fn subscribe<F>(self: &Arc<Self>, key: QueryKey, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        inner
            .subscribers
            .entry(key)
            .or_default()
            .insert(id, Arc::new(callback));
        trace!(key = %key, subscriber = id, "subscribed");
        Subscription {
            store: Arc::downgrade(self),
            key,
            id,
        }
    }

    fn unsubscribe(&self, key: &QueryKey, id: u64) {
        let mut inner = self.lock();
        if let Some(subs) = inner.subscribers.get_mut(key) {
            subs.remove(&id);
            if subs.is_empty() {
                inner.subscribers.remove(key);
            }
        }
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock().subscribers.get(key).map(|s| s.len()).unwrap_or(0)
    }

    /// Drop every entry and invalidation record. Subscriptions are kept.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.generations.clear();
        inner.family_generations.clear();
        inner.written.clear();
        inner.epoch += 1;
        debug!(dropped, epoch = inner.epoch, "cache reset");
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("CacheStore")
            .field("entries", &inner.entries.len())
            .field("subscribed_keys", &inner.subscribers.len())
            .field("epoch", &inner.epoch)
            .finish()
    }
}

/// Handle for a store subscription; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<CacheStore>,
    key: QueryKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> QueryKey {
        self.key
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(&self.key, self.id);
        }
    }
}
