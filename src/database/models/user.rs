use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::nullable;

/// Row shape of the `users` table; list columns are stored as JSON text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub skills: Json<Vec<String>>,
    pub causes: Json<Vec<String>>,
    pub total_hours: f64,
    pub total_points: i64,
    pub joined_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub causes: Vec<String>,
    pub total_hours: f64,
    pub total_points: i64,
    pub joined_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            profile_image: None,
            bio: None,
            skills: Vec::new(),
            causes: Vec::new(),
            total_hours: 0.0,
            total_points: 0,
            joined_date: now,
            updated_at: now,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            profile_image: row.profile_image,
            bio: row.bio,
            skills: row.skills.0,
            causes: row.causes.0,
            total_hours: row.total_hours,
            total_points: row.total_points,
            joined_date: row.joined_date,
            updated_at: row.updated_at,
        }
    }
}

/// Compact user shape embedded in events, teams and help requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[sqlx(default)]
    pub email: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            profile_image: user.profile_image.clone(),
            email: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Profile changes; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub bio: Option<Option<String>>,
    pub skills: Option<Vec<String>>,
    pub causes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub profile_image: Option<Option<String>>,
    pub password: Option<String>,
}
