use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: i64,
    pub time: DateTime<Utc>,
}
