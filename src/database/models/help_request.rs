use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;
use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
    #[serde(rename_all = "kebab-case")]
    pub enum UrgencyLevel {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
    #[serde(rename_all = "kebab-case")]
    pub enum HelpStatus {
        #[default]
        Open => "open",
        InProgress => "in-progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl HelpStatus {
    /// Status after the helper count moved from `before` to `after`.
    ///
    /// The first helper moves an open request to in-progress and losing the last
    /// helper moves it back. Completed and cancelled are terminal here; only the
    /// requestor changes them.
    pub fn next_status(self, before: i64, after: i64) -> HelpStatus {
        match self {
            HelpStatus::Open if before == 0 && after > 0 => HelpStatus::InProgress,
            HelpStatus::InProgress if before > 0 && after == 0 => HelpStatus::Open,
            status => status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub urgency_level: UrgencyLevel,
    pub status: HelpStatus,
    pub requestor_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHelpRequestInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub urgency_level: Option<UrgencyLevel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHelpRequestInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub urgency_level: Option<UrgencyLevel>,
    pub status: Option<HelpStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestQuery {
    pub urgency_level: Option<UrgencyLevel>,
    pub status: Option<HelpStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HelpHelper {
    pub id: String,
    pub help_request_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestItem {
    #[serde(flatten)]
    pub help_request: HelpRequest,
    pub requestor: UserSummary,
    pub helper_count: i64,
    pub helpers: Vec<UserSummary>,
}
