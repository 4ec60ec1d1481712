use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    // Update responses carry updated_at instead of created_at
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Team {
    pub fn created_display(&self) -> String {
        self.created_at
            .map(|dt| dt.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}
