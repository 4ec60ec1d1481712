//! In-memory query cache.
//!
//! This module provides the `CacheStore` holding one `CachedEntry` per
//! `QueryKey`, and the `FetchExecutor` that fills it from the API.
//!
//! Entries are never expired by time. They become stale only when a
//! mutation invalidates them, and keep serving their last-known data until
//! the next fetch replaces it. `reset` drops everything, e.g. on logout.

pub mod entry;
pub mod fetch;
pub mod key;
pub mod store;

pub use entry::CachedEntry;
pub use fetch::FetchExecutor;
pub use key::{KeyFamily, QueryKey};
pub use store::{CacheStore, FetchTicket, Subscription};
