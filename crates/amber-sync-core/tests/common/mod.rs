//! In-memory records server for integration tests.
//!
//! Implements `Transport` directly: enforces versions the way the real
//! API does, computes the rating from stored results and records every
//! request it serves.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use amber_sync_core::api::{ApiError, ApiRequest, ApiResult, Method, Transport};
use amber_sync_core::SyncClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

const TIMESTAMP: &str = "2026-03-01T10:00:00Z";

#[derive(Clone)]
struct TeamRow {
    name: String,
    version: i32,
}

#[derive(Clone)]
struct MemberRow {
    team_id: i64,
    name: String,
    version: i32,
}

#[derive(Clone)]
struct TournamentRow {
    name: String,
    date: String,
    location: String,
    version: i32,
}

#[derive(Clone)]
struct ResultRow {
    team_id: i64,
    tournament_id: i64,
    place: i64,
    version: i32,
}

#[derive(Clone)]
struct UserRow {
    username: String,
    role: String,
}

struct State {
    next_id: i64,
    me: i64,
    teams: BTreeMap<i64, TeamRow>,
    members: BTreeMap<i64, MemberRow>,
    tournaments: BTreeMap<i64, TournamentRow>,
    results: BTreeMap<i64, ResultRow>,
    users: BTreeMap<i64, UserRow>,
}

pub struct FakeServer {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
}

fn not_found(code: &str) -> ApiError {
    ApiError::NotFound {
        code: code.to_string(),
    }
}

fn validation(details: &str) -> ApiError {
    ApiError::Validation {
        code: "validation_error".to_string(),
        details: Some(details.to_string()),
    }
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::Validation {
        code: "invalid_id".to_string(),
        details: None,
    })
}

fn body_str(body: &Value, field: &str) -> ApiResult<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| validation(&format!("{} is required", field)))
}

fn body_i64(body: &Value, field: &str) -> ApiResult<i64> {
    body.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| validation(&format!("{} is required", field)))
}

/// Compare-and-swap on a stored version.
fn check_version(current: i32, body: &Value) -> ApiResult<()> {
    let presented = body_i64(body, "version")? as i32;
    if presented != current {
        return Err(ApiError::Conflict {
            current_version: Some(current),
        });
    }
    Ok(())
}

fn list(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({"items": items, "meta": {"limit": 50, "offset": 0, "total": total}})
}

impl State {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn team_json(&self, id: i64, team: &TeamRow) -> Value {
        json!({"id": id, "name": team.name, "created_at": TIMESTAMP, "version": team.version})
    }

    fn member_json(id: i64, member: &MemberRow) -> Value {
        json!({
            "id": id, "name": member.name, "team_id": member.team_id,
            "joined_at": TIMESTAMP, "version": member.version
        })
    }

    fn tournament_json(id: i64, t: &TournamentRow) -> Value {
        json!({
            "id": id, "name": t.name, "date": t.date, "location": t.location,
            "created_at": TIMESTAMP, "version": t.version
        })
    }

    fn result_json(&self, id: i64, r: &ResultRow) -> Value {
        json!({
            "id": id, "team_id": r.team_id, "tournament_id": r.tournament_id,
            "place": r.place, "recorded_at": TIMESTAMP, "version": r.version,
            "team_name": self.teams.get(&r.team_id).map(|t| t.name.clone()),
            "tournament_name": self.tournaments.get(&r.tournament_id).map(|t| t.name.clone()),
            "tournament_date": self.tournaments.get(&r.tournament_id).map(|t| t.date.clone()),
        })
    }

    fn user_json(id: i64, user: &UserRow) -> Value {
        json!({"telegram_id": id, "username": user.username, "role": user.role, "created_at": TIMESTAMP})
    }

    fn rating(&self) -> Value {
        let mut rows = Vec::new();
        for (team_id, team) in &self.teams {
            let places: Vec<i64> = self
                .results
                .values()
                .filter(|r| r.team_id == *team_id)
                .map(|r| r.place)
                .collect();
            if places.is_empty() {
                continue;
            }
            let top = places.iter().filter(|p| **p == 1).count();
            let avg = places.iter().sum::<i64>() as f64 / places.len() as f64;
            rows.push(json!({
                "team_id": team_id, "team_name": team.name, "top_places": top,
                "total_games": places.len(), "avg_place": avg
            }));
        }
        list(rows)
    }

    fn route(&mut self, request: &ApiRequest) -> ApiResult<Value> {
        let full = request.full_path();
        let segments: Vec<&str> = full.split('/').filter(|s| !s.is_empty()).collect();
        let empty = json!({});
        let body = request.body.as_ref().unwrap_or(&empty);

        match (request.method, segments.as_slice()) {
            (Method::Get, ["public", "me"]) => {
                let user = self.users.get(&self.me).ok_or_else(|| ApiError::Unauthorized {
                    code: "unauthorized".to_string(),
                })?;
                Ok(Self::user_json(self.me, user))
            }
            (Method::Get, ["public", "teams"]) => {
                Ok(list(self.teams.iter().map(|(id, t)| self.team_json(*id, t)).collect()))
            }
            (Method::Get, ["public", "teams", id]) => {
                let id = parse_id(id)?;
                let team = self.teams.get(&id).ok_or_else(|| not_found("team_not_found"))?;
                Ok(self.team_json(id, team))
            }
            (Method::Get, ["public", "teams", id, "members"]) => {
                let id = parse_id(id)?;
                Ok(list(
                    self.members
                        .iter()
                        .filter(|(_, m)| m.team_id == id)
                        .map(|(mid, m)| Self::member_json(*mid, m))
                        .collect(),
                ))
            }
            (Method::Get, ["public", "teams", id, "results"]) => {
                let id = parse_id(id)?;
                Ok(list(
                    self.results
                        .iter()
                        .filter(|(_, r)| r.team_id == id)
                        .map(|(rid, r)| self.result_json(*rid, r))
                        .collect(),
                ))
            }
            (Method::Get, ["public", "tournaments"]) => Ok(list(
                self.tournaments
                    .iter()
                    .map(|(id, t)| Self::tournament_json(*id, t))
                    .collect(),
            )),
            (Method::Get, ["public", "tournaments", id]) => {
                let id = parse_id(id)?;
                let t = self
                    .tournaments
                    .get(&id)
                    .ok_or_else(|| not_found("tournament_not_found"))?;
                Ok(Self::tournament_json(id, t))
            }
            (Method::Get, ["public", "tournaments", id, "results"]) => {
                let id = parse_id(id)?;
                Ok(list(
                    self.results
                        .iter()
                        .filter(|(_, r)| r.tournament_id == id)
                        .map(|(rid, r)| self.result_json(*rid, r))
                        .collect(),
                ))
            }
            (Method::Get, ["public", "rating"]) => Ok(self.rating()),
            (Method::Get, ["private", "users"]) => Ok(list(
                self.users
                    .iter()
                    .map(|(id, u)| Self::user_json(*id, u))
                    .collect(),
            )),

            (Method::Post, ["private", "teams"]) => {
                let name = body_str(body, "name")?;
                let id = self.allocate();
                let team = TeamRow { name, version: 1 };
                let response = self.team_json(id, &team);
                self.teams.insert(id, team);
                Ok(response)
            }
            (Method::Patch, ["private", "teams", id]) => {
                let id = parse_id(id)?;
                let name = body_str(body, "name")?;
                let team = self.teams.get_mut(&id).ok_or_else(|| not_found("team_not_found"))?;
                check_version(team.version, body)?;
                team.name = name;
                team.version += 1;
                Ok(json!({"id": id, "name": team.name, "updated_at": TIMESTAMP, "version": team.version}))
            }
            (Method::Delete, ["private", "teams", id]) => {
                let id = parse_id(id)?;
                let team = self.teams.get(&id).ok_or_else(|| not_found("team_not_found"))?;
                check_version(team.version, body)?;
                self.teams.remove(&id);
                Ok(json!({"deleted": true}))
            }

            (Method::Post, ["private", "teams", team_id, "members"]) => {
                let team_id = parse_id(team_id)?;
                if !self.teams.contains_key(&team_id) {
                    return Err(not_found("team_not_found"));
                }
                let name = body_str(body, "name")?;
                let id = self.allocate();
                let member = MemberRow {
                    team_id,
                    name,
                    version: 1,
                };
                let response = Self::member_json(id, &member);
                self.members.insert(id, member);
                Ok(response)
            }
            (Method::Patch, ["private", "teams", _, "members", id]) => {
                let id = parse_id(id)?;
                let name = body_str(body, "name")?;
                let member = self.members.get_mut(&id).ok_or_else(|| not_found("member_not_found"))?;
                check_version(member.version, body)?;
                member.name = name;
                member.version += 1;
                Ok(json!({"id": id, "name": member.name, "version": member.version}))
            }
            (Method::Delete, ["private", "teams", _, "members", id]) => {
                let id = parse_id(id)?;
                let member = self.members.get(&id).ok_or_else(|| not_found("member_not_found"))?;
                check_version(member.version, body)?;
                self.members.remove(&id);
                Ok(json!({"deleted": true}))
            }

            (Method::Post, ["private", "tournaments"]) => {
                let id = self.allocate();
                let tournament = TournamentRow {
                    name: body_str(body, "name")?,
                    date: body_str(body, "date")?,
                    location: body_str(body, "location").unwrap_or_default(),
                    version: 1,
                };
                let response = Self::tournament_json(id, &tournament);
                self.tournaments.insert(id, tournament);
                Ok(response)
            }
            (Method::Patch, ["private", "tournaments", id]) => {
                let id = parse_id(id)?;
                let t = self
                    .tournaments
                    .get_mut(&id)
                    .ok_or_else(|| not_found("tournament_not_found"))?;
                check_version(t.version, body)?;
                t.name = body_str(body, "name")?;
                t.date = body_str(body, "date")?;
                t.location = body_str(body, "location").unwrap_or_default();
                t.version += 1;
                Ok(json!({"id": id, "name": t.name, "version": t.version}))
            }
            (Method::Delete, ["private", "tournaments", id]) => {
                let id = parse_id(id)?;
                let t = self
                    .tournaments
                    .get(&id)
                    .ok_or_else(|| not_found("tournament_not_found"))?;
                check_version(t.version, body)?;
                self.tournaments.remove(&id);
                Ok(json!({"deleted": true}))
            }

            (Method::Post, ["private", "tournaments", tournament_id, "results"]) => {
                let tournament_id = parse_id(tournament_id)?;
                let team_id = body_i64(body, "team_id")?;
                if !self.tournaments.contains_key(&tournament_id) {
                    return Err(not_found("tournament_not_found"));
                }
                if !self.teams.contains_key(&team_id) {
                    return Err(not_found("team_not_found"));
                }
                let id = self.allocate();
                let result = ResultRow {
                    team_id,
                    tournament_id,
                    place: body_i64(body, "place")?,
                    version: 1,
                };
                let response = json!({
                    "id": id, "tournament_id": tournament_id, "team_id": team_id,
                    "place": result.place, "recorded_at": TIMESTAMP, "version": 1
                });
                self.results.insert(id, result);
                Ok(response)
            }
            (Method::Patch, ["private", "tournaments", _, "results", id]) => {
                let id = parse_id(id)?;
                let place = body_i64(body, "place")?;
                let r = self.results.get_mut(&id).ok_or_else(|| not_found("result_not_found"))?;
                check_version(r.version, body)?;
                r.place = place;
                r.version += 1;
                Ok(json!({"id": id, "place": r.place, "version": r.version}))
            }
            (Method::Delete, ["private", "tournaments", _, "results", id]) => {
                let id = parse_id(id)?;
                let removed = self.results.get(&id).ok_or_else(|| not_found("result_not_found"))?;
                check_version(removed.version, body)?;
                let removed = removed.clone();
                self.results.remove(&id);
                // Close the gap left in the tournament's placings
                for r in self.results.values_mut() {
                    if r.tournament_id == removed.tournament_id && r.place > removed.place {
                        r.place -= 1;
                        r.version += 1;
                    }
                }
                Ok(json!({"deleted": true, "id": id}))
            }

            (Method::Put, ["private", "users", telegram_id, "role"]) => {
                let telegram_id = parse_id(telegram_id)?;
                if telegram_id == self.me {
                    return Err(ApiError::Validation {
                        code: "cannot_change_own_role".to_string(),
                        details: None,
                    });
                }
                let role = body_str(body, "role")?;
                let user = self
                    .users
                    .get_mut(&telegram_id)
                    .ok_or_else(|| not_found("user_not_found"))?;
                user.role = role;
                Ok(json!({"telegram_id": telegram_id, "username": user.username, "role": user.role}))
            }

            _ => Err(not_found("route_not_found")),
        }
    }
}

impl FakeServer {
    /// Server with one admin user (telegram id 1000) acting as "me".
    pub fn new() -> Arc<Self> {
        let mut users = BTreeMap::new();
        users.insert(
            1000,
            UserRow {
                username: "organizer".to_string(),
                role: "admin".to_string(),
            },
        );
        Arc::new(Self {
            state: Mutex::new(State {
                next_id: 0,
                me: 1000,
                teams: BTreeMap::new(),
                members: BTreeMap::new(),
                tournaments: BTreeMap::new(),
                results: BTreeMap::new(),
                users,
            }),
            calls: Mutex::new(Vec::new()),
            holds: Mutex::new(HashMap::new()),
        })
    }

    pub fn client(self: &Arc<Self>) -> SyncClient {
        SyncClient::new(Arc::clone(self) as Arc<dyn Transport>)
    }

    pub fn add_user(&self, telegram_id: i64, username: &str, role: &str) {
        self.state.lock().unwrap().users.insert(
            telegram_id,
            UserRow {
                username: username.to_string(),
                role: role.to_string(),
            },
        );
    }

    /// Rename a team as if another client did it, bumping its version.
    pub fn rename_team_elsewhere(&self, id: i64, name: &str) -> i32 {
        let mut state = self.state.lock().unwrap();
        let team = state.teams.get_mut(&id).expect("team exists");
        team.name = name.to_string();
        team.version += 1;
        team.version
    }

    pub fn team_version(&self, id: i64) -> Option<i32> {
        self.state.lock().unwrap().teams.get(&id).map(|t| t.version)
    }

    /// Hold responses for `route` until the returned handle is notified.
    /// The response body is computed before the hold.
    pub fn hold(&self, route: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(route.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, route: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == route).count()
    }

    pub fn count_prefix(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let route = request.to_string();
        self.calls.lock().unwrap().push(route.clone());
        let response = self.state.lock().unwrap().route(&request);
        let hold = self.holds.lock().unwrap().remove(&route);
        if let Some(notify) = hold {
            notify.notified().await;
        }
        response
    }
}
