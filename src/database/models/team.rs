use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Event, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub team_image: String,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub team_image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub team_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub team_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub is_public: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamEvent {
    pub id: String,
    pub team_id: String,
    pub event_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEventInput {
    pub event_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamListItem {
    #[serde(flatten)]
    pub team: Team,
    pub creator: UserSummary,
    pub member_count: i64,
    pub members: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub creator: UserSummary,
    pub member_count: i64,
    pub members: Vec<UserSummary>,
    pub events: Vec<Event>,
}

impl TeamDetail {
    /// Private teams are visible to their members only; the creator is always a member.
    pub fn is_visible_to(&self, user_id: Option<&str>) -> bool {
        if self.team.is_public {
            return true;
        }

        match user_id {
            Some(user_id) => {
                self.team.creator_id == user_id || self.members.iter().any(|m| m.id == user_id)
            }
            None => false,
        }
    }
}
