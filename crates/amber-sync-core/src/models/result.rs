use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Placement of one team in one tournament.
///
/// `team_name`, `tournament_name` and `tournament_date` are denormalized by
/// the server for display and are never sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub id: i64,
    // Update responses echo only id, place and version
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub tournament_id: Option<i64>,
    pub place: u32,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    pub version: i32,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub tournament_name: Option<String>,
    #[serde(default)]
    pub tournament_date: Option<NaiveDate>,
}

impl TournamentResult {
    pub fn is_top_place(&self) -> bool {
        self.place == 1
    }

    pub fn team_display(&self) -> String {
        match (&self.team_name, self.team_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("Team #{}", id),
            (None, None) => "-".to_string(),
        }
    }
}
