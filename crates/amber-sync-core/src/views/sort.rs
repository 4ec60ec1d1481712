use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{Rating, Team, Tournament, TournamentResult};

use super::collation::Collation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// ============================================================================
// Teams
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSortKey {
    Name,
    CreatedAt,
}

impl TeamSortKey {
    pub fn natural_direction(self) -> SortDirection {
        match self {
            TeamSortKey::Name => SortDirection::Asc,
            // Newest first
            TeamSortKey::CreatedAt => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamSort {
    pub key: TeamSortKey,
    pub direction: SortDirection,
}

impl TeamSort {
    pub fn by(key: TeamSortKey) -> Self {
        Self {
            key,
            direction: key.natural_direction(),
        }
    }
}

impl Default for TeamSort {
    fn default() -> Self {
        Self::by(TeamSortKey::Name)
    }
}

/// Teams whose name contains `query` (case-insensitive), in `sort` order.
pub fn team_view(teams: &[Team], query: &str, sort: TeamSort, collation: &Collation) -> Vec<Team> {
    let needle = query.trim().to_lowercase();
    let mut view: Vec<Team> = teams
        .iter()
        .filter(|t| needle.is_empty() || t.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    view.sort_by(|a, b| {
        let ordering = match sort.key {
            TeamSortKey::Name => collation.compare(&a.name, &b.name),
            TeamSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        sort.direction.apply(ordering)
    });
    view
}

// ============================================================================
// Tournaments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentSortKey {
    Date,
    Name,
}

impl TournamentSortKey {
    pub fn natural_direction(self) -> SortDirection {
        match self {
            // Most recent first
            TournamentSortKey::Date => SortDirection::Desc,
            TournamentSortKey::Name => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSort {
    pub key: TournamentSortKey,
    pub direction: SortDirection,
}

impl TournamentSort {
    pub fn by(key: TournamentSortKey) -> Self {
        Self {
            key,
            direction: key.natural_direction(),
        }
    }
}

impl Default for TournamentSort {
    fn default() -> Self {
        Self::by(TournamentSortKey::Date)
    }
}

pub fn tournament_view(
    tournaments: &[Tournament],
    sort: TournamentSort,
    collation: &Collation,
) -> Vec<Tournament> {
    let mut view = tournaments.to_vec();
    view.sort_by(|a, b| {
        let ordering = match sort.key {
            TournamentSortKey::Date => (a.date - b.date).num_days().cmp(&0),
            TournamentSortKey::Name => collation.compare(&a.name, &b.name),
        };
        sort.direction.apply(ordering)
    });
    view
}

/// Split into (upcoming, past) relative to `today`, keeping input order.
/// A tournament held today counts as past.
pub fn split_by_date(tournaments: &[Tournament], today: NaiveDate) -> (Vec<Tournament>, Vec<Tournament>) {
    tournaments.iter().cloned().partition(|t| t.is_upcoming(today))
}

// ============================================================================
// Rating
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSortKey {
    TeamName,
    TopPlaces,
    AvgPlace,
}

impl RatingSortKey {
    /// Direction a freshly selected column starts with.
    pub fn natural_direction(self) -> SortDirection {
        match self {
            // Lower average place is better
            RatingSortKey::AvgPlace => SortDirection::Asc,
            RatingSortKey::TeamName | RatingSortKey::TopPlaces => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingSort {
    pub key: RatingSortKey,
    pub direction: SortDirection,
}

impl Default for RatingSort {
    fn default() -> Self {
        Self {
            key: RatingSortKey::TopPlaces,
            direction: SortDirection::Desc,
        }
    }
}

impl RatingSort {
    /// Column click: the same key flips direction, a new key starts at its
    /// natural direction.
    pub fn select(self, key: RatingSortKey) -> Self {
        if key == self.key {
            Self {
                key,
                direction: self.direction.toggle(),
            }
        } else {
            Self {
                key,
                direction: key.natural_direction(),
            }
        }
    }
}

pub fn rating_view(rows: &[Rating], sort: RatingSort, collation: &Collation) -> Vec<Rating> {
    let mut view = rows.to_vec();
    view.sort_by(|a, b| {
        let ordering = match sort.key {
            RatingSortKey::TeamName => collation.compare(&a.team_name, &b.team_name),
            RatingSortKey::TopPlaces => (i64::from(a.top_places) - i64::from(b.top_places)).cmp(&0),
            RatingSortKey::AvgPlace => a.avg_place.total_cmp(&b.avg_place),
        };
        sort.direction.apply(ordering)
    });
    view
}

// ============================================================================
// Tournament results
// ============================================================================

pub fn results_by_place(results: &[TournamentResult]) -> Vec<TournamentResult> {
    let mut view = results.to_vec();
    view.sort_by_key(|r| r.place);
    view
}
