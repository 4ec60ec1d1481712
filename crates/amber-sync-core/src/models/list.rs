use serde::{Deserialize, Serialize};

/// Standard envelope for list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
}

impl<T> ListResponse<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the server holds more rows than this page carries
    pub fn is_truncated(&self) -> bool {
        (self.meta.offset as usize + self.items.len()) < self.meta.total as usize
    }
}

/// Confirmation returned by delete endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Minimal echo of an updated entity: its id and new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned {
    pub id: i64,
    pub version: i32,
}
