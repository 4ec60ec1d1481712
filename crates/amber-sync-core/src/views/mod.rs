//! Sorted and filtered views over cached collections.
//!
//! Everything here is a pure function of its input: no fetches, no cache
//! access. Sort state belongs to the caller and is never cached.
//!
//! Text compares through a locale collator (`ru` by default) so Cyrillic
//! names order the way a reader expects, not by code point.

pub mod collation;
pub mod sort;

pub use collation::Collation;
pub use sort::{
    rating_view, results_by_place, split_by_date, team_view, tournament_view, RatingSort,
    RatingSortKey, SortDirection, TeamSort, TeamSortKey, TournamentSort, TournamentSortKey,
};
