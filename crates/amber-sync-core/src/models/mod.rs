//! Data models for the records API.
//!
//! These are read-only projections of server-owned entities:
//!
//! - `Team`, `Member`, `Tournament`, `TournamentResult`: versioned entities
//! - `Rating`: derived per-team aggregate, no version
//! - `User`, `Role`: platform users and their capabilities
//! - `ListResponse`, `Deleted`, `Versioned`: response envelopes

pub mod list;
pub mod member;
pub mod rating;
pub mod result;
pub mod team;
pub mod tournament;
pub mod user;

pub use list::{Deleted, ListMeta, ListResponse, Versioned};
pub use member::Member;
pub use rating::Rating;
pub use result::TournamentResult;
pub use team::Team;
pub use tournament::Tournament;
pub use user::{Role, User};
