//! CLI argument definitions using clap derive

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use amber_sync_core::models::Role;
use amber_sync_core::views::{RatingSortKey, TeamSortKey, TournamentSortKey};

#[derive(Parser)]
#[command(name = "amber-sync")]
#[command(author, version, about = "Browse and edit teams, tournaments and results")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Keychain profile holding the credential
    #[arg(long, global = true, env = "AMBER_PROFILE")]
    pub profile: Option<String>,

    /// Also write logs to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current user and what they may do
    Me,

    /// List teams
    Teams {
        /// Case-insensitive name filter
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: TeamSortArg,
        /// Reverse the default direction
        #[arg(long)]
        reverse: bool,
    },

    /// Show one team
    Team { id: i64 },

    /// List a team's members
    Members { team_id: i64 },

    /// List tournaments, newest first
    Tournaments {
        #[arg(long, value_enum, default_value = "date")]
        sort: TournamentSortArg,
        /// Reverse the default direction
        #[arg(long)]
        reverse: bool,
        /// Only tournaments after today
        #[arg(long, conflicts_with = "past")]
        upcoming: bool,
        /// Only tournaments held today or earlier
        #[arg(long)]
        past: bool,
    },

    /// Show one tournament
    Tournament { id: i64 },

    /// List results of a team or of a tournament
    Results {
        #[arg(long, conflicts_with = "tournament", required_unless_present = "tournament")]
        team: Option<i64>,
        #[arg(long)]
        tournament: Option<i64>,
    },

    /// Show the team rating
    Rating {
        #[arg(long, value_enum, default_value = "top-places")]
        sort: RatingSortArg,
        /// Flip the column's natural direction
        #[arg(long)]
        reverse: bool,
    },

    /// List platform users (admin only)
    Users,

    /// Create a team
    CreateTeam { name: String },

    /// Rename a team
    RenameTeam {
        id: i64,
        name: String,
        /// Version last seen for this team
        #[arg(long)]
        expected_version: i32,
    },

    /// Delete a team
    DeleteTeam {
        id: i64,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
    },

    /// Add a member to a team
    AddMember { team_id: i64, name: String },

    /// Rename a member
    RenameMember {
        team_id: i64,
        id: i64,
        name: String,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
    },

    /// Remove a member from a team
    RemoveMember {
        team_id: i64,
        id: i64,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
    },

    /// Create a tournament
    CreateTournament {
        name: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        location: String,
    },

    /// Update a tournament's name, date and location
    UpdateTournament {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        location: String,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
    },

    /// Delete a tournament
    DeleteTournament {
        id: i64,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
    },

    /// Record a team's place in a tournament
    RecordResult {
        tournament_id: i64,
        team_id: i64,
        place: u32,
    },

    /// Change the place of a recorded result
    UpdateResult {
        tournament_id: i64,
        id: i64,
        place: u32,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
        /// Team of the result, if known
        #[arg(long)]
        team: Option<i64>,
    },

    /// Delete a result; later places in the tournament move up
    DeleteResult {
        tournament_id: i64,
        id: i64,
        /// Version last seen for this record
        #[arg(long)]
        expected_version: i32,
    },

    /// Change a user's role (admin only)
    SetRole { telegram_id: i64, role: RoleArg },

    /// Store the host credential in the OS keychain
    Login {
        /// Credential string; read from stdin when omitted
        #[arg(long, env = "AMBER_INIT_DATA", hide_env_values = true)]
        init_data: Option<String>,
    },

    /// Remove the stored credential
    Logout,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TeamSortArg {
    Name,
    Created,
}

impl From<TeamSortArg> for TeamSortKey {
    fn from(arg: TeamSortArg) -> Self {
        match arg {
            TeamSortArg::Name => TeamSortKey::Name,
            TeamSortArg::Created => TeamSortKey::CreatedAt,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TournamentSortArg {
    Date,
    Name,
}

impl From<TournamentSortArg> for TournamentSortKey {
    fn from(arg: TournamentSortArg) -> Self {
        match arg {
            TournamentSortArg::Date => TournamentSortKey::Date,
            TournamentSortArg::Name => TournamentSortKey::Name,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RatingSortArg {
    TeamName,
    TopPlaces,
    AvgPlace,
}

impl From<RatingSortArg> for RatingSortKey {
    fn from(arg: RatingSortArg) -> Self {
        match arg {
            RatingSortArg::TeamName => RatingSortKey::TeamName,
            RatingSortArg::TopPlaces => RatingSortKey::TopPlaces,
            RatingSortArg::AvgPlace => RatingSortKey::AvgPlace,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    Viewer,
    Organizer,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Viewer => Role::Viewer,
            RoleArg::Organizer => Role::Organizer,
            RoleArg::Admin => Role::Admin,
        }
    }
}
