use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiRequest, ApiResult, Method, Transport};
use crate::models::Role;

use super::invalidation::{EntityKind, Invalidator, MutationIds, Operation};

/// Longest team or member name the server accepts
const MAX_NAME_LEN: usize = 100;
/// Longest tournament name or location the server accepts
const MAX_TOURNAMENT_TEXT_LEN: usize = 200;
const MAX_PLACE: u32 = 1000;

/// A single write against the API.
///
/// Update and delete variants carry the version the caller last read; the
/// server rejects them with a conflict if it has moved on.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateTeam {
        name: String,
    },
    UpdateTeam {
        id: i64,
        name: String,
        version: i32,
    },
    DeleteTeam {
        id: i64,
        version: i32,
    },
    CreateMember {
        team_id: i64,
        name: String,
    },
    UpdateMember {
        team_id: i64,
        id: i64,
        name: String,
        version: i32,
    },
    DeleteMember {
        team_id: i64,
        id: i64,
        version: i32,
    },
    CreateTournament {
        name: String,
        date: NaiveDate,
        location: String,
    },
    UpdateTournament {
        id: i64,
        name: String,
        date: NaiveDate,
        location: String,
        version: i32,
    },
    DeleteTournament {
        id: i64,
        version: i32,
    },
    CreateResult {
        tournament_id: i64,
        team_id: i64,
        place: u32,
    },
    /// `team_id` narrows invalidation to one team; the update response
    /// does not include it.
    UpdateResult {
        tournament_id: i64,
        id: i64,
        team_id: Option<i64>,
        place: u32,
        version: i32,
    },
    DeleteResult {
        tournament_id: i64,
        id: i64,
        version: i32,
    },
    SetUserRole {
        telegram_id: i64,
        role: Role,
    },
}

fn date_str(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn invalid(details: impl Into<String>) -> ApiError {
    ApiError::Validation {
        code: "validation_error".to_string(),
        details: Some(details.into()),
    }
}

fn check_text(field: &str, value: &str, required: bool, max: usize) -> ApiResult<()> {
    let len = value.trim().chars().count();
    if required && len == 0 {
        return Err(invalid(format!("{} is required", field)));
    }
    if len > max {
        return Err(invalid(format!("{} must be at most {} characters", field, max)));
    }
    Ok(())
}

fn check_version(version: i32) -> ApiResult<()> {
    if version < 1 {
        return Err(invalid(format!("version must be at least 1, got {}", version)));
    }
    Ok(())
}

fn check_place(place: u32) -> ApiResult<()> {
    if place == 0 || place > MAX_PLACE {
        return Err(invalid(format!("place must be between 1 and {}", MAX_PLACE)));
    }
    Ok(())
}

impl Mutation {
    pub fn kind(&self) -> EntityKind {
        match self {
            Mutation::CreateTeam { .. } | Mutation::UpdateTeam { .. } | Mutation::DeleteTeam { .. } => {
                EntityKind::Team
            }
            Mutation::CreateMember { .. }
            | Mutation::UpdateMember { .. }
            | Mutation::DeleteMember { .. } => EntityKind::Member,
            Mutation::CreateTournament { .. }
            | Mutation::UpdateTournament { .. }
            | Mutation::DeleteTournament { .. } => EntityKind::Tournament,
            Mutation::CreateResult { .. }
            | Mutation::UpdateResult { .. }
            | Mutation::DeleteResult { .. } => EntityKind::Result,
            Mutation::SetUserRole { .. } => EntityKind::User,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Mutation::CreateTeam { .. }
            | Mutation::CreateMember { .. }
            | Mutation::CreateTournament { .. }
            | Mutation::CreateResult { .. } => Operation::Create,
            Mutation::UpdateTeam { .. }
            | Mutation::UpdateMember { .. }
            | Mutation::UpdateTournament { .. }
            | Mutation::UpdateResult { .. }
            | Mutation::SetUserRole { .. } => Operation::Update,
            Mutation::DeleteTeam { .. }
            | Mutation::DeleteMember { .. }
            | Mutation::DeleteTournament { .. }
            | Mutation::DeleteResult { .. } => Operation::Delete,
        }
    }

    /// Version presented for compare-and-swap, if this write needs one.
    pub fn expected_version(&self) -> Option<i32> {
        match self {
            Mutation::UpdateTeam { version, .. }
            | Mutation::DeleteTeam { version, .. }
            | Mutation::UpdateMember { version, .. }
            | Mutation::DeleteMember { version, .. }
            | Mutation::UpdateTournament { version, .. }
            | Mutation::DeleteTournament { version, .. }
            | Mutation::UpdateResult { version, .. }
            | Mutation::DeleteResult { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Reject payloads the server would refuse, without a round trip.
    pub fn validate(&self) -> ApiResult<()> {
        match self {
            Mutation::CreateTeam { name } | Mutation::CreateMember { name, .. } => {
                check_text("name", name, true, MAX_NAME_LEN)
            }
            Mutation::UpdateTeam { name, version, .. }
            | Mutation::UpdateMember { name, version, .. } => {
                check_text("name", name, true, MAX_NAME_LEN)?;
                check_version(*version)
            }
            Mutation::CreateTournament { name, location, .. } => {
                check_text("name", name, true, MAX_TOURNAMENT_TEXT_LEN)?;
                check_text("location", location, false, MAX_TOURNAMENT_TEXT_LEN)
            }
            Mutation::UpdateTournament {
                name,
                location,
                version,
                ..
            } => {
                check_text("name", name, true, MAX_TOURNAMENT_TEXT_LEN)?;
                check_text("location", location, false, MAX_TOURNAMENT_TEXT_LEN)?;
                check_version(*version)
            }
            Mutation::CreateResult { place, .. } => check_place(*place),
            Mutation::UpdateResult { place, version, .. } => {
                check_place(*place)?;
                check_version(*version)
            }
            Mutation::DeleteTeam { version, .. }
            | Mutation::DeleteMember { version, .. }
            | Mutation::DeleteTournament { version, .. }
            | Mutation::DeleteResult { version, .. } => check_version(*version),
            Mutation::SetUserRole { .. } => Ok(()),
        }
    }

    pub fn request(&self) -> ApiRequest {
        match self {
            Mutation::CreateTeam { name } => {
                ApiRequest::write(Method::Post, "/teams", json!({ "name": name.trim() }))
            }
            Mutation::UpdateTeam { id, name, version } => ApiRequest::write(
                Method::Patch,
                format!("/teams/{}", id),
                json!({ "name": name.trim(), "version": version }),
            ),
            Mutation::DeleteTeam { id, version } => ApiRequest::write(
                Method::Delete,
                format!("/teams/{}", id),
                json!({ "version": version }),
            ),
            Mutation::CreateMember { team_id, name } => ApiRequest::write(
                Method::Post,
                format!("/teams/{}/members", team_id),
                json!({ "name": name.trim() }),
            ),
            Mutation::UpdateMember {
                team_id,
                id,
                name,
                version,
            } => ApiRequest::write(
                Method::Patch,
                format!("/teams/{}/members/{}", team_id, id),
                json!({ "name": name.trim(), "version": version }),
            ),
            Mutation::DeleteMember { team_id, id, version } => ApiRequest::write(
                Method::Delete,
                format!("/teams/{}/members/{}", team_id, id),
                json!({ "version": version }),
            ),
            Mutation::CreateTournament { name, date, location } => ApiRequest::write(
                Method::Post,
                "/tournaments",
                json!({ "name": name.trim(), "date": date_str(date), "location": location.trim() }),
            ),
            Mutation::UpdateTournament {
                id,
                name,
                date,
                location,
                version,
            } => ApiRequest::write(
                Method::Patch,
                format!("/tournaments/{}", id),
                json!({
                    "name": name.trim(),
                    "date": date_str(date),
                    "location": location.trim(),
                    "version": version,
                }),
            ),
            Mutation::DeleteTournament { id, version } => ApiRequest::write(
                Method::Delete,
                format!("/tournaments/{}", id),
                json!({ "version": version }),
            ),
            Mutation::CreateResult {
                tournament_id,
                team_id,
                place,
            } => ApiRequest::write(
                Method::Post,
                format!("/tournaments/{}/results", tournament_id),
                json!({ "team_id": team_id, "place": place }),
            ),
            Mutation::UpdateResult {
                tournament_id,
                id,
                place,
                version,
                ..
            } => ApiRequest::write(
                Method::Patch,
                format!("/tournaments/{}/results/{}", tournament_id, id),
                json!({ "place": place, "version": version }),
            ),
            Mutation::DeleteResult {
                tournament_id,
                id,
                version,
            } => ApiRequest::write(
                Method::Delete,
                format!("/tournaments/{}/results/{}", tournament_id, id),
                json!({ "version": version }),
            ),
            Mutation::SetUserRole { telegram_id, role } => ApiRequest::write(
                Method::Put,
                format!("/users/{}/role", telegram_id),
                json!({ "role": role.as_str() }),
            ),
        }
    }

    /// Ids known before the request is sent.
    pub fn ids(&self) -> MutationIds {
        match *self {
            Mutation::CreateTeam { .. } | Mutation::CreateTournament { .. } => MutationIds::default(),
            Mutation::UpdateTeam { id, .. } | Mutation::DeleteTeam { id, .. } => MutationIds {
                id: Some(id),
                team_id: Some(id),
                tournament_id: None,
            },
            Mutation::CreateMember { team_id, .. } => MutationIds {
                id: None,
                team_id: Some(team_id),
                tournament_id: None,
            },
            Mutation::UpdateMember { team_id, id, .. } | Mutation::DeleteMember { team_id, id, .. } => {
                MutationIds {
                    id: Some(id),
                    team_id: Some(team_id),
                    tournament_id: None,
                }
            }
            Mutation::UpdateTournament { id, .. } | Mutation::DeleteTournament { id, .. } => {
                MutationIds {
                    id: Some(id),
                    team_id: None,
                    tournament_id: Some(id),
                }
            }
            Mutation::CreateResult {
                tournament_id,
                team_id,
                ..
            } => MutationIds {
                id: None,
                team_id: Some(team_id),
                tournament_id: Some(tournament_id),
            },
            Mutation::UpdateResult {
                tournament_id,
                id,
                team_id,
                ..
            } => MutationIds {
                id: Some(id),
                team_id,
                tournament_id: Some(tournament_id),
            },
            Mutation::DeleteResult { tournament_id, id, .. } => MutationIds {
                id: Some(id),
                team_id: None,
                tournament_id: Some(tournament_id),
            },
            Mutation::SetUserRole { telegram_id, .. } => MutationIds {
                id: Some(telegram_id),
                team_id: None,
                tournament_id: None,
            },
        }
    }

    /// Ids after a successful write, completed from the response body.
    pub fn resolved_ids(&self, response: &Value) -> MutationIds {
        let field = |name: &str| response.get(name).and_then(Value::as_i64);
        let mut ids = self.ids();
        ids.id = ids.id.or_else(|| field("id"));
        ids.team_id = ids.team_id.or_else(|| field("team_id"));
        ids.tournament_id = ids.tournament_id.or_else(|| field("tournament_id"));
        match self.kind() {
            EntityKind::Team => ids.team_id = ids.team_id.or(ids.id),
            EntityKind::Tournament => ids.tournament_id = ids.tournament_id.or(ids.id),
            _ => {}
        }
        ids
    }
}

/// Sends writes and applies their cache invalidation.
pub struct MutationExecutor {
    transport: Arc<dyn Transport>,
    invalidator: Invalidator,
}

impl MutationExecutor {
    pub fn new(transport: Arc<dyn Transport>, invalidator: Invalidator) -> Self {
        Self {
            transport,
            invalidator,
        }
    }

    /// Send `mutation` and, once the server confirms it, invalidate the
    /// keys that depend on it.
    ///
    /// The request and the invalidation run on a spawned task, so dropping
    /// the returned future does not cancel a write that was already sent.
    /// Failures, conflicts included, leave the cache untouched.
    pub async fn execute(&self, mutation: Mutation) -> ApiResult<Value> {
        mutation.validate()?;

        let transport = Arc::clone(&self.transport);
        let invalidator = self.invalidator.clone();
        let task = tokio::spawn(async move {
            let request = mutation.request();
            debug!(request = %request, version = ?mutation.expected_version(), "sending mutation");
            match transport.send(request).await {
                Ok(response) => {
                    let ids = mutation.resolved_ids(&response);
                    let stale =
                        invalidator.on_mutated(mutation.kind(), mutation.operation(), &ids);
                    info!(
                        kind = %mutation.kind(),
                        op = %mutation.operation(),
                        id = ?ids.id,
                        invalidated = stale.len(),
                        "mutation applied"
                    );
                    Ok(response)
                }
                Err(err @ ApiError::Conflict { .. }) => {
                    warn!(
                        kind = %mutation.kind(),
                        id = ?mutation.ids().id,
                        error = %err,
                        "mutation rejected, re-read before retrying"
                    );
                    Err(err)
                }
                Err(err) => {
                    warn!(kind = %mutation.kind(), op = %mutation.operation(), error = %err, "mutation failed");
                    Err(err)
                }
            }
        });

        task.await
            .unwrap_or_else(|e| Err(ApiError::Cancelled(e.to_string())))
    }
}
