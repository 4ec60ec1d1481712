//! Plain-text tables for terminal output.

use amber_sync_core::cache::CachedEntry;
use amber_sync_core::models::{
    ListResponse, Member, Rating, Team, Tournament, TournamentResult, User,
};
use serde::Serialize;

/// Print as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// e.g. `3 of 12 shown, fetched 5m ago (stale)`
pub fn status_line<T>(shown: usize, list: &ListResponse<T>, entry: Option<&CachedEntry>) -> String {
    let total = (list.meta.total as usize).max(list.len());
    let mut line = format!("{} of {} shown", shown, total);
    if list.is_truncated() {
        line.push_str(" (partial page)");
    }
    if let Some(entry) = entry {
        line.push_str(&format!(", fetched {}", entry.age_display()));
        if entry.stale {
            line.push_str(" (stale)");
        }
    }
    line
}

pub fn print_teams(teams: &[Team]) {
    println!("{:>6}  {:<32}  {:<10}  {:>3}", "ID", "NAME", "CREATED", "VER");
    for team in teams {
        println!(
            "{:>6}  {:<32}  {:<10}  {:>3}",
            team.id,
            team.name,
            team.created_display(),
            team.version
        );
    }
}

pub fn print_members(members: &[Member]) {
    println!("{:>6}  {:<32}  {:<10}  {:>3}", "ID", "NAME", "JOINED", "VER");
    for member in members {
        let joined = member
            .joined_at
            .map(|dt| dt.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<32}  {:<10}  {:>3}",
            member.id, member.name, joined, member.version
        );
    }
}

pub fn print_tournaments(tournaments: &[Tournament]) {
    println!("{:>6}  {:<10}  {:<32}  {:<20}  {:>3}", "ID", "DATE", "NAME", "LOCATION", "VER");
    for t in tournaments {
        println!(
            "{:>6}  {:<10}  {:<32}  {:<20}  {:>3}",
            t.id,
            t.formatted_date(),
            t.name,
            t.location_display(),
            t.version
        );
    }
}

pub fn print_results(results: &[TournamentResult]) {
    println!("{:>6}  {:>5}  {:<28}  {:<28}  {:>3}", "ID", "PLACE", "TEAM", "TOURNAMENT", "VER");
    for r in results {
        println!(
            "{:>6}  {:>5}  {:<28}  {:<28}  {:>3}",
            r.id,
            r.place,
            r.team_display(),
            r.tournament_name.as_deref().unwrap_or("-"),
            r.version
        );
    }
}

pub fn print_rating(rows: &[Rating]) {
    println!("{:>4}  {:<32}  {:>4}  {:>5}  {:>6}", "#", "TEAM", "TOP", "GAMES", "AVG");
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{:>4}  {:<32}  {:>4}  {:>5}  {:>6}",
            i + 1,
            row.team_name,
            row.top_places,
            row.total_games,
            row.avg_place_display()
        );
    }
}

pub fn print_users(users: &[User]) {
    println!("{:>12}  {:<24}  {:<10}", "TELEGRAM ID", "USER", "ROLE");
    for user in users {
        println!("{:>12}  {:<24}  {:<10}", user.telegram_id, user.display_name(), user.role);
    }
}

pub fn print_user(user: &User) {
    println!("{} ({})", user.display_name(), user.role);
    println!("  telegram id: {}", user.telegram_id);
    println!("  can manage records: {}", if user.can_manage() { "yes" } else { "no" });
    println!("  admin: {}", if user.is_admin() { "yes" } else { "no" });
}
