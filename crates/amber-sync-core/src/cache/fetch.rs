use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResult, Transport};

use super::entry::CachedEntry;
use super::key::QueryKey;
use super::store::{CacheStore, FetchTicket};

type SharedFetch = Shared<BoxFuture<'static, ApiResult<Value>>>;

struct InFlight {
    id: u64,
    ticket: FetchTicket,
    future: SharedFetch,
}

type InFlightMap = Arc<Mutex<HashMap<QueryKey, InFlight>>>;

fn lock_map(map: &Mutex<HashMap<QueryKey, InFlight>>) -> MutexGuard<'_, HashMap<QueryKey, InFlight>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fills the cache from the API, one request per key at a time.
///
/// Each fetch runs on its own tokio task. Callers that stop waiting do not
/// cancel it; the result is still written to the store.
pub struct FetchExecutor {
    transport: Arc<dyn Transport>,
    store: Arc<CacheStore>,
    in_flight: InFlightMap,
    next_id: AtomicU64,
}

impl FetchExecutor {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<CacheStore>) -> Self {
        Self {
            transport,
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Data for `key`, fetching only if the entry is absent or stale.
    ///
    /// Concurrent callers for the same key share one request and receive
    /// the same value or the same error. A failed fetch leaves the entry
    /// as it was.
    pub async fn ensure(&self, key: QueryKey) -> ApiResult<Value> {
        if let Some(entry) = self.store.get(&key) {
            if !entry.stale {
                debug!(key = %key, "cache hit");
                return Ok(entry.data);
            }
        }
        self.join_or_start(key).await
    }

    /// Current entry for `key`, possibly stale, with a background refresh
    /// started when it is stale or missing.
    ///
    /// The refresh needs a Tokio runtime. Called outside one, the entry is
    /// returned as is and nothing is fetched.
    pub fn revalidate(&self, key: QueryKey) -> Option<CachedEntry> {
        let entry = self.store.get(&key);
        if entry.as_ref().map(|e| e.stale).unwrap_or(true) {
            if Handle::try_current().is_ok() {
                // The spawned task completes on its own
                drop(self.join_or_start(key));
            } else {
                warn!(key = %key, "no async runtime, skipping background refresh");
            }
        }
        entry
    }

    fn join_or_start(&self, key: QueryKey) -> SharedFetch {
        let mut in_flight = lock_map(&self.in_flight);

        // A fetch may have landed since the caller looked
        if let Some(entry) = self.store.get(&key) {
            if !entry.stale {
                return future::ready(Ok(entry.data)).boxed().shared();
            }
        }

        let ticket = self.store.fetch_ticket(&key);
        if let Some(existing) = in_flight.get(&key) {
            if existing.ticket == ticket {
                debug!(key = %key, "joining in-flight fetch");
                return existing.future.clone();
            }
            debug!(key = %key, "in-flight fetch is outdated, starting a new one");
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.in_flight);

        debug!(key = %key, "cache miss, fetching");
        let handle = tokio::spawn(async move {
            let result = transport.send(key.request()).await;
            match &result {
                Ok(data) => {
                    store.complete_fetch(key, data.clone(), ticket);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "fetch failed");
                }
            }
            // Registry lock is held by the spawner until the entry is inserted
            let mut map = lock_map(&registry);
            if map.get(&key).map(|f| f.id) == Some(id) {
                map.remove(&key);
            }
            result
        });

        let future = handle
            .map(|joined| joined.unwrap_or_else(|e| Err(ApiError::Cancelled(e.to_string()))))
            .boxed()
            .shared();
        in_flight.insert(
            key,
            InFlight {
                id,
                ticket,
                future: future.clone(),
            },
        );
        future
    }

    /// Number of keys with a fetch currently running.
    pub fn in_flight_count(&self) -> usize {
        lock_map(&self.in_flight).len()
    }

    /// Forget running fetches. Their results are discarded by the store
    /// once it has been reset.
    pub fn clear_in_flight(&self) {
        lock_map(&self.in_flight).clear();
    }
}
