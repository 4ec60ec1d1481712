use serde::{Deserialize, Serialize};

/// Derived per-team aggregate, recomputed by the server from all results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub team_id: i64,
    pub team_name: String,
    /// Number of first places
    pub top_places: u32,
    pub total_games: u32,
    pub avg_place: f64,
}

impl Rating {
    pub fn avg_place_display(&self) -> String {
        format!("{:.2}", self.avg_place)
    }
}
