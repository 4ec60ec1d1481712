//! High-level entry point tying the cache, fetches and mutations together.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, ApiResult, Transport};
use crate::auth::Credential;
use crate::cache::{CacheStore, CachedEntry, FetchExecutor, QueryKey, Subscription};
use crate::config::Config;
use crate::models::{
    Deleted, ListResponse, Member, Rating, Role, Team, Tournament, TournamentResult, User,
    Versioned,
};
use crate::sync::{Invalidator, Mutation, MutationExecutor};

/// Shared handle to the sync layer. Clone is cheap; all clones share one
/// cache.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<CacheStore>,
    fetcher: FetchExecutor,
    mutations: MutationExecutor,
}

impl SyncClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(CacheStore::new());
        let fetcher = FetchExecutor::new(Arc::clone(&transport), Arc::clone(&store));
        let mutations = MutationExecutor::new(transport, Invalidator::new(Arc::clone(&store)));
        Self {
            inner: Arc::new(Inner {
                store,
                fetcher,
                mutations,
            }),
        }
    }

    /// Build a client talking HTTP to the configured API.
    pub fn from_config(config: &Config, credential: Option<Credential>) -> ApiResult<Self> {
        let mut api = ApiClient::new(config)?;
        if let Some(credential) = credential {
            api.set_credential(credential);
        }
        Ok(Self::new(Arc::new(api)))
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.inner.store
    }

    pub fn subscribe<F>(&self, key: QueryKey, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(key, callback)
    }

    /// Cached entry for `key` without touching the network.
    pub fn cached(&self, key: QueryKey) -> Option<CachedEntry> {
        self.inner.store.get(&key)
    }

    /// Cached entry for `key`, refreshing it in the background when stale.
    pub fn revalidate(&self, key: QueryKey) -> Option<CachedEntry> {
        self.inner.fetcher.revalidate(key)
    }

    /// Read `key` through the cache and decode it.
    pub async fn read<T: DeserializeOwned>(&self, key: QueryKey) -> ApiResult<T> {
        let data = self.inner.fetcher.ensure(key).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Send a write and invalidate what it affects.
    pub async fn execute(&self, mutation: Mutation) -> ApiResult<Value> {
        self.inner.mutations.execute(mutation).await
    }

    async fn execute_as<T: DeserializeOwned>(&self, mutation: Mutation) -> ApiResult<T> {
        let data = self.execute(mutation).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Drop all cached data and forget running fetches, e.g. on logout.
    /// Subscriptions stay registered.
    pub fn reset(&self) {
        self.inner.fetcher.clear_in_flight();
        self.inner.store.reset();
        info!("sync cache reset");
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn me(&self) -> ApiResult<User> {
        self.read(QueryKey::Me).await
    }

    pub async fn teams(&self) -> ApiResult<ListResponse<Team>> {
        self.read(QueryKey::Teams).await
    }

    pub async fn team(&self, id: i64) -> ApiResult<Team> {
        self.read(QueryKey::Team(id)).await
    }

    pub async fn team_members(&self, team_id: i64) -> ApiResult<ListResponse<Member>> {
        self.read(QueryKey::TeamMembers(team_id)).await
    }

    pub async fn team_results(&self, team_id: i64) -> ApiResult<ListResponse<TournamentResult>> {
        self.read(QueryKey::TeamResults(team_id)).await
    }

    pub async fn tournaments(&self) -> ApiResult<ListResponse<Tournament>> {
        self.read(QueryKey::Tournaments).await
    }

    pub async fn tournament(&self, id: i64) -> ApiResult<Tournament> {
        self.read(QueryKey::Tournament(id)).await
    }

    pub async fn tournament_results(
        &self,
        tournament_id: i64,
    ) -> ApiResult<ListResponse<TournamentResult>> {
        self.read(QueryKey::TournamentResults(tournament_id)).await
    }

    pub async fn rating(&self) -> ApiResult<ListResponse<Rating>> {
        self.read(QueryKey::Rating).await
    }

    /// Admin-only listing of platform users.
    pub async fn users(&self) -> ApiResult<ListResponse<User>> {
        self.read(QueryKey::Users).await
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    pub async fn create_team(&self, name: &str) -> ApiResult<Team> {
        self.execute_as(Mutation::CreateTeam {
            name: name.to_string(),
        })
        .await
    }

    pub async fn update_team(&self, id: i64, name: &str, version: i32) -> ApiResult<Team> {
        self.execute_as(Mutation::UpdateTeam {
            id,
            name: name.to_string(),
            version,
        })
        .await
    }

    pub async fn delete_team(&self, id: i64, version: i32) -> ApiResult<Deleted> {
        self.execute_as(Mutation::DeleteTeam { id, version }).await
    }

    pub async fn create_member(&self, team_id: i64, name: &str) -> ApiResult<Member> {
        self.execute_as(Mutation::CreateMember {
            team_id,
            name: name.to_string(),
        })
        .await
    }

    pub async fn update_member(
        &self,
        team_id: i64,
        id: i64,
        name: &str,
        version: i32,
    ) -> ApiResult<Member> {
        self.execute_as(Mutation::UpdateMember {
            team_id,
            id,
            name: name.to_string(),
            version,
        })
        .await
    }

    pub async fn delete_member(&self, team_id: i64, id: i64, version: i32) -> ApiResult<Deleted> {
        self.execute_as(Mutation::DeleteMember {
            team_id,
            id,
            version,
        })
        .await
    }

    pub async fn create_tournament(
        &self,
        name: &str,
        date: NaiveDate,
        location: &str,
    ) -> ApiResult<Tournament> {
        self.execute_as(Mutation::CreateTournament {
            name: name.to_string(),
            date,
            location: location.to_string(),
        })
        .await
    }

    /// The server echoes only id, name and version; re-read the
    /// tournament for the full record.
    pub async fn update_tournament(
        &self,
        id: i64,
        name: &str,
        date: NaiveDate,
        location: &str,
        version: i32,
    ) -> ApiResult<Versioned> {
        self.execute_as(Mutation::UpdateTournament {
            id,
            name: name.to_string(),
            date,
            location: location.to_string(),
            version,
        })
        .await
    }

    pub async fn delete_tournament(&self, id: i64, version: i32) -> ApiResult<Deleted> {
        self.execute_as(Mutation::DeleteTournament { id, version }).await
    }

    pub async fn create_result(
        &self,
        tournament_id: i64,
        team_id: i64,
        place: u32,
    ) -> ApiResult<TournamentResult> {
        self.execute_as(Mutation::CreateResult {
            tournament_id,
            team_id,
            place,
        })
        .await
    }

    /// Pass `team_id` when known to limit invalidation to that team's
    /// results; without it every team's results are refreshed.
    pub async fn update_result(
        &self,
        tournament_id: i64,
        id: i64,
        team_id: Option<i64>,
        place: u32,
        version: i32,
    ) -> ApiResult<TournamentResult> {
        self.execute_as(Mutation::UpdateResult {
            tournament_id,
            id,
            team_id,
            place,
            version,
        })
        .await
    }

    pub async fn delete_result(
        &self,
        tournament_id: i64,
        id: i64,
        version: i32,
    ) -> ApiResult<Deleted> {
        self.execute_as(Mutation::DeleteResult {
            tournament_id,
            id,
            version,
        })
        .await
    }

    /// Change a user's role. The response echoes the user without
    /// `created_at`.
    pub async fn set_user_role(&self, telegram_id: i64, role: Role) -> ApiResult<User> {
        self.execute_as(Mutation::SetUserRole { telegram_id, role }).await
    }
}
