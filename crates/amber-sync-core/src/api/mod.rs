//! REST API client module for the tournament-records service.
//!
//! This module provides the `ApiClient` for communicating with the
//! records API, the [`Transport`] seam the executors are written against,
//! and the `ApiError` taxonomy every operation reports.
//!
//! Reads live under the `/public` prefix, writes under `/private`. Every
//! request carries an `Authorization: <scheme> <credential>` header whose
//! credential is supplied by the hosting environment.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use transport::{Access, ApiRequest, Method, Transport};
