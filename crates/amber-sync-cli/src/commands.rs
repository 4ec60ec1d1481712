//! Subcommand handlers.

use std::io::{self, BufRead};

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use amber_sync_core::auth::{Credential, CredentialStore};
use amber_sync_core::models::{ListResponse, TournamentResult};
use amber_sync_core::views::{
    rating_view, results_by_place, split_by_date, team_view, tournament_view, Collation,
    RatingSort, RatingSortKey, TeamSort, TournamentSort,
};
use amber_sync_core::{ApiError, Config, QueryKey, SyncClient};

use crate::cli::{Commands, GlobalOpts};
use crate::output;

/// Turn a conflict into an actionable message; other errors pass through.
fn explain(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Conflict { current_version } => {
            let now = current_version
                .map(|v| format!(" (now at version {})", v))
                .unwrap_or_default();
            anyhow::anyhow!(
                "Record was changed by someone else{}. Re-read it and retry with the new version.",
                now
            )
        }
        ApiError::Unauthorized { .. } => anyhow::anyhow!(
            "{}. Run `amber-sync login` or set AMBER_INIT_DATA.",
            err
        ),
        other => other.into(),
    }
}

fn emit<T: Serialize>(global: &GlobalOpts, value: &T, table: impl FnOnce(&T)) -> Result<()> {
    if global.json {
        output::print_json(value)
    } else {
        table(value);
        Ok(())
    }
}

/// Row count and cache age under a table. Omitted for JSON output.
fn footer<T>(
    global: &GlobalOpts,
    client: &SyncClient,
    key: QueryKey,
    shown: usize,
    list: &ListResponse<T>,
) {
    if !global.json {
        let entry = client.cached(key);
        println!("{}", output::status_line(shown, list, entry.as_ref()));
    }
}

fn profile<'a>(global: &'a GlobalOpts, config: &'a Config) -> &'a str {
    global.profile.as_deref().unwrap_or_else(|| config.profile())
}

/// Credential from the environment, else from the keychain profile.
pub fn resolve_credential(global: &GlobalOpts, config: &Config) -> Option<Credential> {
    if let Some(credential) = Credential::from_env() {
        return Some(credential);
    }
    let profile = profile(global, config);
    match CredentialStore::get(profile) {
        Ok(credential) => Some(credential),
        Err(e) => {
            warn!(profile, error = %e, "No stored credential");
            None
        }
    }
}

pub async fn run(command: Commands, global: &GlobalOpts, mut config: Config) -> Result<()> {
    let credential = match command {
        Commands::Login { .. } | Commands::Logout => None,
        _ => resolve_credential(global, &config),
    };
    let client = SyncClient::from_config(&config, credential)
        .context("Failed to create API client")?;

    match command {
        Commands::Me => {
            let me = client.me().await.map_err(explain)?;
            emit(global, &me, output::print_user)
        }
        Commands::Teams {
            search,
            sort,
            reverse,
        } => {
            let teams = client.teams().await.map_err(explain)?;
            let collation = Collation::new(&config.locale)?;
            let mut sort = TeamSort::by(sort.into());
            if reverse {
                sort.direction = sort.direction.toggle();
            }
            let view = team_view(&teams.items, search.as_deref().unwrap_or(""), sort, &collation);
            emit(global, &view, |v| output::print_teams(v))?;
            footer(global, &client, QueryKey::Teams, view.len(), &teams);
            Ok(())
        }
        Commands::Team { id } => {
            let team = client.team(id).await.map_err(explain)?;
            emit(global, &team, |t| output::print_teams(std::slice::from_ref(t)))
        }
        Commands::Members { team_id } => {
            let members = client.team_members(team_id).await.map_err(explain)?;
            emit(global, &members.items, |m| output::print_members(m))?;
            footer(global, &client, QueryKey::TeamMembers(team_id), members.len(), &members);
            Ok(())
        }
        Commands::Tournaments {
            sort,
            reverse,
            upcoming,
            past,
        } => {
            let tournaments = client.tournaments().await.map_err(explain)?;
            let collation = Collation::new(&config.locale)?;
            let mut sort = TournamentSort::by(sort.into());
            if reverse {
                sort.direction = sort.direction.toggle();
            }
            let view = tournament_view(&tournaments.items, sort, &collation);
            let view = if upcoming || past {
                let (next, before) = split_by_date(&view, Local::now().date_naive());
                if upcoming {
                    next
                } else {
                    before
                }
            } else {
                view
            };
            emit(global, &view, |v| output::print_tournaments(v))?;
            footer(global, &client, QueryKey::Tournaments, view.len(), &tournaments);
            Ok(())
        }
        Commands::Tournament { id } => {
            let tournament = client.tournament(id).await.map_err(explain)?;
            emit(global, &tournament, |t| {
                output::print_tournaments(std::slice::from_ref(t))
            })
        }
        Commands::Results { team, tournament } => {
            let key = match (team, tournament) {
                (Some(team_id), _) => QueryKey::TeamResults(team_id),
                (None, Some(tournament_id)) => QueryKey::TournamentResults(tournament_id),
                (None, None) => bail!("Pass --team or --tournament"),
            };
            let results: ListResponse<TournamentResult> =
                client.read(key).await.map_err(explain)?;
            let view = results_by_place(&results.items);
            emit(global, &view, |v| output::print_results(v))?;
            footer(global, &client, key, view.len(), &results);
            Ok(())
        }
        Commands::Rating { sort, reverse } => {
            let rows = client.rating().await.map_err(explain)?;
            let collation = Collation::new(&config.locale)?;
            let key: RatingSortKey = sort.into();
            let mut sort = RatingSort {
                key,
                direction: key.natural_direction(),
            };
            if reverse {
                sort.direction = sort.direction.toggle();
            }
            let view = rating_view(&rows.items, sort, &collation);
            emit(global, &view, |v| output::print_rating(v))?;
            footer(global, &client, QueryKey::Rating, view.len(), &rows);
            Ok(())
        }
        Commands::Users => {
            let users = client.users().await.map_err(explain)?;
            emit(global, &users.items, |u| output::print_users(u))?;
            footer(global, &client, QueryKey::Users, users.len(), &users);
            Ok(())
        }

        Commands::CreateTeam { name } => {
            let team = client.create_team(&name).await.map_err(explain)?;
            info!(id = team.id, "Team created");
            emit(global, &team, |t| output::print_teams(std::slice::from_ref(t)))
        }
        Commands::RenameTeam {
            id,
            name,
            expected_version: version,
        } => {
            let team = client.update_team(id, &name, version).await.map_err(explain)?;
            emit(global, &team, |t| output::print_teams(std::slice::from_ref(t)))
        }
        Commands::DeleteTeam {
            id,
            expected_version: version,
        } => {
            let deleted = client.delete_team(id, version).await.map_err(explain)?;
            emit(global, &deleted, |_| println!("Team {} deleted", id))
        }
        Commands::AddMember { team_id, name } => {
            let member = client.create_member(team_id, &name).await.map_err(explain)?;
            emit(global, &member, |m| output::print_members(std::slice::from_ref(m)))
        }
        Commands::RenameMember {
            team_id,
            id,
            name,
            expected_version: version,
        } => {
            let member = client
                .update_member(team_id, id, &name, version)
                .await
                .map_err(explain)?;
            emit(global, &member, |m| output::print_members(std::slice::from_ref(m)))
        }
        Commands::RemoveMember {
            team_id,
            id,
            expected_version: version,
        } => {
            let deleted = client
                .delete_member(team_id, id, version)
                .await
                .map_err(explain)?;
            emit(global, &deleted, |_| println!("Member {} removed", id))
        }
        Commands::CreateTournament {
            name,
            date,
            location,
        } => {
            let tournament = client
                .create_tournament(&name, date, &location)
                .await
                .map_err(explain)?;
            emit(global, &tournament, |t| {
                output::print_tournaments(std::slice::from_ref(t))
            })
        }
        Commands::UpdateTournament {
            id,
            name,
            date,
            location,
            expected_version: version,
        } => {
            let echo = client
                .update_tournament(id, &name, date, &location, version)
                .await
                .map_err(explain)?;
            emit(global, &echo, |e| {
                println!("Tournament {} updated, now version {}", e.id, e.version)
            })
        }
        Commands::DeleteTournament {
            id,
            expected_version: version,
        } => {
            let deleted = client.delete_tournament(id, version).await.map_err(explain)?;
            emit(global, &deleted, |_| println!("Tournament {} deleted", id))
        }
        Commands::RecordResult {
            tournament_id,
            team_id,
            place,
        } => {
            let result = client
                .create_result(tournament_id, team_id, place)
                .await
                .map_err(explain)?;
            emit(global, &result, |r| output::print_results(std::slice::from_ref(r)))
        }
        Commands::UpdateResult {
            tournament_id,
            id,
            place,
            expected_version: version,
            team,
        } => {
            let result = client
                .update_result(tournament_id, id, team, place, version)
                .await
                .map_err(explain)?;
            emit(global, &result, |r| {
                println!("Result {} now at place {}, version {}", r.id, r.place, r.version)
            })
        }
        Commands::DeleteResult {
            tournament_id,
            id,
            expected_version: version,
        } => {
            let deleted = client
                .delete_result(tournament_id, id, version)
                .await
                .map_err(explain)?;
            emit(global, &deleted, |_| println!("Result {} deleted", id))
        }
        Commands::SetRole { telegram_id, role } => {
            let user = client
                .set_user_role(telegram_id, role.into())
                .await
                .map_err(explain)?;
            emit(global, &user, output::print_user)
        }

        Commands::Login { init_data } => login(init_data, global, &mut config),
        Commands::Logout => logout(&client, global, &config),
    }
}

fn login(init_data: Option<String>, global: &GlobalOpts, config: &mut Config) -> Result<()> {
    let raw = match init_data {
        Some(value) => value,
        None => {
            eprintln!("Paste the init data string and press Enter:");
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read credential from stdin")?;
            line
        }
    };
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("Credential is empty");
    }

    let profile = profile(global, config).to_string();
    CredentialStore::store(&profile, &Credential::new(raw))?;
    config.last_profile = Some(profile.clone());
    config.save().context("Failed to save config")?;
    info!(profile = %profile, "Credential stored");
    println!("Logged in as profile '{}'", profile);
    Ok(())
}

fn logout(client: &SyncClient, global: &GlobalOpts, config: &Config) -> Result<()> {
    client.reset();
    let profile = profile(global, config);
    if !CredentialStore::has_credential(profile) {
        println!("No credential stored for profile '{}'", profile);
        return Ok(());
    }
    CredentialStore::delete(profile)?;
    println!("Logged out of profile '{}'", profile);
    Ok(())
}
