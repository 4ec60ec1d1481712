use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::ApiResult;

/// One cached projection and its staleness state.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub data: Value,
    pub cached_at: DateTime<Utc>,
    /// Flagged by invalidation; the data is still served until replaced
    pub stale: bool,
}

impl CachedEntry {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            stale: false,
        }
    }

    /// Decode the cached JSON into a model type.
    pub fn decode<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            // Round up: 1h 30m+ becomes 2h
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
