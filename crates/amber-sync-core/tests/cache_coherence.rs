//! End-to-end coherence scenarios against the in-memory server.

mod common;

use amber_sync_core::{ApiError, QueryKey};
use chrono::NaiveDate;
use common::FakeServer;

fn spring_cup() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 5).unwrap()
}

#[tokio::test]
async fn test_repeated_reads_fetch_once() {
    let server = FakeServer::new();
    let client = server.client();
    client.create_team("Falcons").await.unwrap();

    for _ in 0..5 {
        let teams = client.teams().await.unwrap();
        assert_eq!(teams.items.len(), 1);
    }
    assert_eq!(server.count("GET /public/teams"), 1);
}

#[tokio::test]
async fn test_falcons_alice_only_touches_members() {
    let server = FakeServer::new();
    let client = server.client();

    let falcons = client.create_team("Falcons").await.unwrap();
    assert_eq!(falcons.version, 1);

    let teams = client.teams().await.unwrap();
    assert_eq!(teams.items[0].name, "Falcons");
    let members = client.team_members(falcons.id).await.unwrap();
    assert!(members.is_empty());

    let alice = client.create_member(falcons.id, "Alice").await.unwrap();
    assert_eq!(alice.team_id, Some(falcons.id));

    let store = client.store();
    assert!(store.is_stale(&QueryKey::TeamMembers(falcons.id)));
    assert!(!store.is_stale(&QueryKey::Teams));

    server.reset_calls();
    client.teams().await.unwrap();
    assert!(server.calls().is_empty(), "all-teams must be served from cache");

    let members = client.team_members(falcons.id).await.unwrap();
    assert_eq!(members.items[0].name, "Alice");
    let route = format!("GET /public/teams/{}/members", falcons.id);
    assert_eq!(server.count(&route), 1);
    assert_eq!(server.calls().len(), 1);
}

#[tokio::test]
async fn test_recorded_result_refreshes_rating() {
    let server = FakeServer::new();
    let client = server.client();
    let team = client.create_team("Соколы").await.unwrap();
    let cup = client
        .create_tournament("Кубок весны", spring_cup(), "Казань")
        .await
        .unwrap();

    let rating = client.rating().await.unwrap();
    assert!(rating.is_empty());

    client.create_result(cup.id, team.id, 1).await.unwrap();
    assert!(client.store().is_stale(&QueryKey::Rating));

    let rating = client.rating().await.unwrap();
    assert_eq!(server.count("GET /public/rating"), 2);
    assert_eq!(rating.items[0].team_id, team.id);
    assert_eq!(rating.items[0].top_places, 1);
}

#[tokio::test]
async fn test_stale_version_conflict_keeps_cache() {
    let server = FakeServer::new();
    let client = server.client();
    let team = client.create_team("Falcons").await.unwrap();
    let renamed = client.update_team(team.id, "Falcons II", 1).await.unwrap();
    assert_eq!(renamed.version, 2);

    let cached = client.team(team.id).await.unwrap();
    assert_eq!(cached.version, 2);
    assert_eq!(server.rename_team_elsewhere(team.id, "Hawks"), 3);

    let before = client.store().snapshot();
    let err = client.update_team(team.id, "Eagles", 2).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Conflict {
            current_version: Some(3)
        }
    );
    assert_eq!(client.store().snapshot(), before);

    // Still the pre-attempt value until the caller re-reads
    assert_eq!(client.team(team.id).await.unwrap().name, "Falcons II");

    client.store().invalidate(&QueryKey::Team(team.id));
    let fresh = client.team(team.id).await.unwrap();
    assert_eq!(fresh.version, 3);
    assert_eq!(fresh.name, "Hawks");
    let retried = client.update_team(team.id, "Eagles", fresh.version).await.unwrap();
    assert_eq!(retried.version, 4);
}

#[tokio::test]
async fn test_conflicting_delete_leaves_team() {
    let server = FakeServer::new();
    let client = server.client();
    let team = client.create_team("Falcons").await.unwrap();
    client.teams().await.unwrap();
    server.rename_team_elsewhere(team.id, "Hawks");

    let before = client.store().snapshot();
    let err = client.delete_team(team.id, 1).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(client.store().snapshot(), before);
    assert_eq!(server.team_version(team.id), Some(2));
}

#[tokio::test]
async fn test_version_round_trip() {
    let server = FakeServer::new();
    let client = server.client();

    let created = client.create_team("Falcons").await.unwrap();
    assert_eq!(client.team(created.id).await.unwrap().version, 1);

    let v2 = client.update_team(created.id, "Falcons", 1).await.unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(client.team(created.id).await.unwrap().version, 2);

    let v3 = client.update_team(created.id, "Falcons", 2).await.unwrap();
    assert_eq!(v3.version, 3);
    assert_eq!(client.team(created.id).await.unwrap().version, 3);

    let route = format!("GET /public/teams/{}", created.id);
    assert_eq!(server.count(&route), 3);
}

#[tokio::test]
async fn test_double_invalidation_refetches_once() {
    let server = FakeServer::new();
    let client = server.client();
    let team = client.create_team("Falcons").await.unwrap();
    client.teams().await.unwrap();

    client.create_member(team.id, "Alice").await.unwrap();
    client.update_team(team.id, "Falcons", 1).await.unwrap();
    client.create_team("Hawks").await.unwrap();
    assert!(!client.store().invalidate(&QueryKey::Teams));

    server.reset_calls();
    client.teams().await.unwrap();
    client.teams().await.unwrap();
    assert_eq!(server.count("GET /public/teams"), 1);
}

#[tokio::test]
async fn test_result_delete_refreshes_other_teams() {
    let server = FakeServer::new();
    let client = server.client();
    let falcons = client.create_team("Falcons").await.unwrap();
    let hawks = client.create_team("Hawks").await.unwrap();
    let cup = client
        .create_tournament("Spring Cup", spring_cup(), "")
        .await
        .unwrap();
    let first = client.create_result(cup.id, falcons.id, 1).await.unwrap();
    client.create_result(cup.id, hawks.id, 2).await.unwrap();

    assert_eq!(client.team_results(hawks.id).await.unwrap().items[0].place, 2);
    client.team_results(falcons.id).await.unwrap();
    client.tournament_results(cup.id).await.unwrap();

    let deleted = client.delete_result(cup.id, first.id, first.version).await.unwrap();
    assert!(deleted.deleted);
    assert_eq!(deleted.id, Some(first.id));

    let store = client.store();
    assert!(store.is_stale(&QueryKey::TeamResults(hawks.id)));
    assert!(store.is_stale(&QueryKey::TeamResults(falcons.id)));
    assert!(store.is_stale(&QueryKey::TournamentResults(cup.id)));

    let hawks_results = client.team_results(hawks.id).await.unwrap();
    assert_eq!(hawks_results.items[0].place, 1);
}

#[tokio::test]
async fn test_result_update_without_team_widens_to_all_teams() {
    let server = FakeServer::new();
    let client = server.client();
    let falcons = client.create_team("Falcons").await.unwrap();
    let hawks = client.create_team("Hawks").await.unwrap();
    let cup = client
        .create_tournament("Spring Cup", spring_cup(), "")
        .await
        .unwrap();
    let result = client.create_result(cup.id, falcons.id, 2).await.unwrap();
    client.team_results(falcons.id).await.unwrap();
    client.team_results(hawks.id).await.unwrap();

    let updated = client
        .update_result(cup.id, result.id, None, 1, result.version)
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.team_id, None);

    assert!(client.store().is_stale(&QueryKey::TeamResults(falcons.id)));
    assert!(client.store().is_stale(&QueryKey::TeamResults(hawks.id)));
}

#[tokio::test]
async fn test_team_delete_refreshes_rating() {
    let server = FakeServer::new();
    let client = server.client();
    let team = client.create_team("Falcons").await.unwrap();
    let cup = client
        .create_tournament("Spring Cup", spring_cup(), "")
        .await
        .unwrap();
    client.create_result(cup.id, team.id, 1).await.unwrap();
    assert_eq!(client.rating().await.unwrap().len(), 1);

    client.delete_team(team.id, 1).await.unwrap();
    assert!(client.store().is_stale(&QueryKey::Rating));
    assert!(client.rating().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tournament_update_touches_tournament_keys_only() {
    let server = FakeServer::new();
    let client = server.client();
    let cup = client
        .create_tournament("Spring Cup", spring_cup(), "Kazan")
        .await
        .unwrap();
    client.tournaments().await.unwrap();
    client.tournament(cup.id).await.unwrap();
    client.tournament_results(cup.id).await.unwrap();

    let echo = client
        .update_tournament(cup.id, "Spring Cup 2026", spring_cup(), "Kazan", 1)
        .await
        .unwrap();
    assert_eq!(echo.version, 2);

    let store = client.store();
    assert!(store.is_stale(&QueryKey::Tournaments));
    assert!(store.is_stale(&QueryKey::Tournament(cup.id)));
    assert!(!store.is_stale(&QueryKey::TournamentResults(cup.id)));
    assert_eq!(client.tournament(cup.id).await.unwrap().name, "Spring Cup 2026");
}

#[tokio::test]
async fn test_role_update_and_capabilities() {
    let server = FakeServer::new();
    server.add_user(2000, "viewer", "viewer");
    let client = server.client();

    let me = client.me().await.unwrap();
    assert!(me.can_manage());
    assert!(me.is_admin());

    assert_eq!(client.users().await.unwrap().len(), 2);
    let updated = client
        .set_user_role(2000, amber_sync_core::models::Role::Organizer)
        .await
        .unwrap();
    assert!(updated.can_manage());
    assert!(client.store().is_stale(&QueryKey::Users));
    assert!(!client.store().is_stale(&QueryKey::Me));

    let err = client
        .set_user_role(me.telegram_id, amber_sync_core::models::Role::Viewer)
        .await
        .unwrap_err();
    match err {
        ApiError::Validation { code, .. } => assert_eq!(code, "cannot_change_own_role"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_read_is_not_cached() {
    let server = FakeServer::new();
    let client = server.client();

    let err = client.team(404).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { ref code } if code == "team_not_found"));
    assert!(client.cached(QueryKey::Team(404)).is_none());

    client.team(404).await.unwrap_err();
    assert_eq!(server.count("GET /public/teams/404"), 2);
}
