use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: i64,
    pub name: String,
    /// Calendar date of the event, `YYYY-MM-DD` on the wire
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Tournament {
    /// True when the tournament is still ahead of `today`. An event held
    /// today already counts as past.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date > today
    }

    pub fn formatted_date(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }

    pub fn location_display(&self) -> &str {
        if self.location.trim().is_empty() {
            "-"
        } else {
            &self.location
        }
    }
}
