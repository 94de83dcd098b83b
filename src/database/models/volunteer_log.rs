use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Points awarded per volunteered hour when the organizer does not set them.
pub const POINTS_PER_HOUR: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerLog {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub hours: f64,
    pub points: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerLogVerifier {
    pub id: String,
    pub log_id: String,
    pub verifier_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolunteerLogInput {
    pub user_id: String,
    pub hours: f64,
    pub points: Option<i64>,
    pub notes: Option<String>,
}

impl CreateVolunteerLogInput {
    pub fn resolved_points(&self) -> i64 {
        self.points
            .unwrap_or_else(|| (self.hours * POINTS_PER_HOUR).round() as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub title: String,
    pub date: DateTime<Utc>,
}

/// A volunteer log as shown on a user's history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerHistoryEntry {
    #[serde(flatten)]
    pub log: VolunteerLog,
    pub event: HistoryEvent,
    pub verified_by: Vec<String>,
}
