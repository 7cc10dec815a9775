use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counts over every stored session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Number of readable session records
    pub active_sessions: usize,

    /// Sum of analyses across those records
    pub total_analyses: usize,
}

/// Per-session line of the detailed admin statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub total_analyses: usize,
}
