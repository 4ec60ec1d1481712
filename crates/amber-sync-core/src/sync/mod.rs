//! Write path: mutations and the cache invalidation they trigger.
//!
//! `MutationExecutor` sends create, update and delete requests. Updates and
//! deletes carry the version the caller last saw, and a mismatch comes back
//! as `ApiError::Conflict`. Only after the server confirms a write does the
//! `Invalidator` mark the dependent cache keys stale, following the table in
//! [`invalidation::dependencies`].

pub mod invalidation;
pub mod mutation;

pub use invalidation::{dependencies, EntityKind, Invalidator, KeyPattern, MutationIds, Operation};
pub use mutation::{Mutation, MutationExecutor};
