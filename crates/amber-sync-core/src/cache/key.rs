use std::fmt;

use crate::api::{Access, ApiRequest};

/// Address of one cached projection.
///
/// Collection keys and single-item keys are independent: `Teams` and
/// `Team(7)` share nothing in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    Me,
    Teams,
    Team(i64),
    TeamMembers(i64),
    TeamResults(i64),
    Tournaments,
    Tournament(i64),
    TournamentResults(i64),
    Rating,
    Users,
}

/// Keys that differ only by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyFamily {
    Team,
    TeamMembers,
    TeamResults,
    Tournament,
    TournamentResults,
}

impl QueryKey {
    /// Read request that produces this key's data.
    pub fn request(&self) -> ApiRequest {
        match self {
            QueryKey::Me => ApiRequest::get(Access::Public, "/me"),
            QueryKey::Teams => ApiRequest::get(Access::Public, "/teams"),
            QueryKey::Team(id) => ApiRequest::get(Access::Public, format!("/teams/{}", id)),
            QueryKey::TeamMembers(id) => {
                ApiRequest::get(Access::Public, format!("/teams/{}/members", id))
            }
            QueryKey::TeamResults(id) => {
                ApiRequest::get(Access::Public, format!("/teams/{}/results", id))
            }
            QueryKey::Tournaments => ApiRequest::get(Access::Public, "/tournaments"),
            QueryKey::Tournament(id) => {
                ApiRequest::get(Access::Public, format!("/tournaments/{}", id))
            }
            QueryKey::TournamentResults(id) => {
                ApiRequest::get(Access::Public, format!("/tournaments/{}/results", id))
            }
            QueryKey::Rating => ApiRequest::get(Access::Public, "/rating"),
            // Admin listing lives under the private prefix
            QueryKey::Users => ApiRequest::get(Access::Private, "/users"),
        }
    }

    pub fn family(&self) -> Option<KeyFamily> {
        match self {
            QueryKey::Team(_) => Some(KeyFamily::Team),
            QueryKey::TeamMembers(_) => Some(KeyFamily::TeamMembers),
            QueryKey::TeamResults(_) => Some(KeyFamily::TeamResults),
            QueryKey::Tournament(_) => Some(KeyFamily::Tournament),
            QueryKey::TournamentResults(_) => Some(KeyFamily::TournamentResults),
            _ => None,
        }
    }
}

impl KeyFamily {
    pub fn key(&self, id: i64) -> QueryKey {
        match self {
            KeyFamily::Team => QueryKey::Team(id),
            KeyFamily::TeamMembers => QueryKey::TeamMembers(id),
            KeyFamily::TeamResults => QueryKey::TeamResults(id),
            KeyFamily::Tournament => QueryKey::Tournament(id),
            KeyFamily::TournamentResults => QueryKey::TournamentResults(id),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Me => write!(f, "me"),
            QueryKey::Teams => write!(f, "teams"),
            QueryKey::Team(id) => write!(f, "team/{}", id),
            QueryKey::TeamMembers(id) => write!(f, "team/{}/members", id),
            QueryKey::TeamResults(id) => write!(f, "team/{}/results", id),
            QueryKey::Tournaments => write!(f, "tournaments"),
            QueryKey::Tournament(id) => write!(f, "tournament/{}", id),
            QueryKey::TournamentResults(id) => write!(f, "tournament/{}/results", id),
            QueryKey::Rating => write!(f, "rating"),
            QueryKey::Users => write!(f, "users"),
        }
    }
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFamily::Team => write!(f, "team/*"),
            KeyFamily::TeamMembers => write!(f, "team/*/members"),
            KeyFamily::TeamResults => write!(f, "team/*/results"),
            KeyFamily::Tournament => write!(f, "tournament/*"),
            KeyFamily::TournamentResults => write!(f, "tournament/*/results"),
        }
    }
}
