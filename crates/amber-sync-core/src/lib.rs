//! amber-sync core library.
//!
//! Client-side data synchronization for the tournament-records API: a
//! query-addressable cache shared by every view, deduplicated fetches,
//! version-checked mutations and the invalidation table that keeps the
//! cache coherent after writes.
//!
//! This crate has no terminal or UI dependencies and can be reused by
//! different front-ends.
//!
//! # Modules
//!
//! - [`api`] - HTTP client, transport seam and error taxonomy
//! - [`auth`] - Host-supplied credential and keychain storage
//! - [`cache`] - Cache store and fetch executor
//! - [`sync`] - Mutation executor and invalidation table
//! - [`models`] - Entity types
//! - [`views`] - Collated sorting and filtering of cached lists
//! - [`config`] - Application configuration

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod sync;
pub mod views;

pub use api::{ApiError, ApiResult};
pub use cache::QueryKey;
pub use client::SyncClient;
pub use config::Config;
