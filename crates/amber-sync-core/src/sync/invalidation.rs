use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheStore, KeyFamily, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Team,
    Member,
    Tournament,
    Result,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Team => "team",
            EntityKind::Member => "member",
            EntityKind::Tournament => "tournament",
            EntityKind::Result => "result",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Cache keys a mutation can make stale, before ids are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    AllTeams,
    Team,
    TeamMembers,
    TeamResults,
    /// `team(*).results`, whatever the ids in the mutation
    AllTeamResults,
    AllTournaments,
    Tournament,
    TournamentResults,
    Rating,
    AllUsers,
}

/// Keys made stale by each kind of write.
///
/// This table is the only source of cache coherence. Relationships are not
/// inferred from foreign keys, so a new mutation needs a new row.
pub fn dependencies(kind: EntityKind, op: Operation) -> &'static [KeyPattern] {
    use EntityKind as K;
    use KeyPattern as P;
    use Operation as O;

    match (kind, op) {
        (K::Team, O::Create) => &[P::AllTeams],
        (K::Team, O::Update) => &[P::AllTeams, P::Team],
        // Results of a deleted team drop out of the rating
        (K::Team, O::Delete) => &[P::AllTeams, P::Team, P::Rating],
        (K::Member, _) => &[P::TeamMembers],
        (K::Tournament, O::Create) => &[P::AllTournaments],
        (K::Tournament, O::Update | O::Delete) => &[P::AllTournaments, P::Tournament],
        (K::Result, O::Create | O::Update) => &[P::TournamentResults, P::TeamResults, P::Rating],
        // The server shifts the remaining places of the tournament, which
        // touches other teams' result lists
        (K::Result, O::Delete) => &[P::TournamentResults, P::AllTeamResults, P::Rating],
        (K::User, _) => &[P::AllUsers],
    }
}

/// Ids known for a mutation once it has succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationIds {
    pub id: Option<i64>,
    pub team_id: Option<i64>,
    pub tournament_id: Option<i64>,
}

/// A resolved pattern: one key, or every key of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySelector {
    Exact(QueryKey),
    Family(KeyFamily),
}

impl KeyPattern {
    /// Fill in ids; a missing id widens the pattern to its whole family.
    pub fn resolve(&self, ids: &MutationIds) -> KeySelector {
        let by_id = |id: Option<i64>, family: KeyFamily| match id {
            Some(id) => KeySelector::Exact(family.key(id)),
            None => KeySelector::Family(family),
        };
        match self {
            KeyPattern::AllTeams => KeySelector::Exact(QueryKey::Teams),
            KeyPattern::Team => by_id(ids.team_id, KeyFamily::Team),
            KeyPattern::TeamMembers => by_id(ids.team_id, KeyFamily::TeamMembers),
            KeyPattern::TeamResults => by_id(ids.team_id, KeyFamily::TeamResults),
            KeyPattern::AllTeamResults => KeySelector::Family(KeyFamily::TeamResults),
            KeyPattern::AllTournaments => KeySelector::Exact(QueryKey::Tournaments),
            KeyPattern::Tournament => by_id(ids.tournament_id, KeyFamily::Tournament),
            KeyPattern::TournamentResults => {
                by_id(ids.tournament_id, KeyFamily::TournamentResults)
            }
            KeyPattern::Rating => KeySelector::Exact(QueryKey::Rating),
            KeyPattern::AllUsers => KeySelector::Exact(QueryKey::Users),
        }
    }
}

/// Applies the dependency table to the cache store.
#[derive(Debug, Clone)]
pub struct Invalidator {
    store: Arc<CacheStore>,
}

impl Invalidator {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Mark stale every key `(kind, op)` depends on.
    ///
    /// Returns the keys that went from fresh to stale; keys that were
    /// already stale or not cached are left alone.
    pub fn on_mutated(&self, kind: EntityKind, op: Operation, ids: &MutationIds) -> Vec<QueryKey> {
        let selectors: BTreeSet<KeySelector> = dependencies(kind, op)
            .iter()
            .map(|pattern| pattern.resolve(ids))
            .collect();

        let mut changed = Vec::new();
        for selector in selectors {
            match selector {
                KeySelector::Exact(key) => {
                    if self.store.invalidate(&key) {
                        changed.push(key);
                    }
                }
                KeySelector::Family(family) => {
                    changed.extend(self.store.invalidate_family(family));
                }
            }
        }
        changed.sort();
        changed.dedup();
        debug!(kind = %kind, op = %op, invalidated = ?changed, "applied invalidation");
        changed
    }
}
