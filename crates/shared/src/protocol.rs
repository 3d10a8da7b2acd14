use serde::{Deserialize, Serialize};

/// Response header carrying cache provenance of a list fetch.
pub const CACHE_MARKER_HEADER: &str = "X-Cache";

pub const ENTRIES_PATH: &str = "/api/entries";
pub const STATS_PATH: &str = "/api/stats";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub total_entries_db: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_entries_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_available: Option<bool>,
}

impl StatsResponse {
    pub fn total_entries(&self) -> i64 {
        self.total_entries_db.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}
