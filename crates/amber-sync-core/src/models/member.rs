use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    // Update responses echo only id, name and version
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    pub version: i32,
}
