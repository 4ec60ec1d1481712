//! Authentication module for the host-supplied credential.
//!
//! This module provides:
//! - `Credential`: the opaque credential string the hosting environment hands us
//! - `CredentialStore`: OS-level credential storage via keyring, keyed by profile
//!
//! The sync layer never generates or validates credentials; it only forwards
//! them in the `Authorization` header.

pub mod credential;
pub mod credentials;

pub use credential::Credential;
pub use credentials::CredentialStore;
