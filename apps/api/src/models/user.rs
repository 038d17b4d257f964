use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub grade_level: Option<String>,
    pub exam_type: Option<String>,
    pub learning_style: Option<String>,
    pub emotional_state: String,
    pub ai_personality: String,
    pub xp: i32,
    pub level: i32,
    pub streak_days: i32,
    pub created_at: DateTime<Utc>,
}

/// The subset of a user returned alongside auth tokens.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub level: i32,
    pub xp: i32,
    pub emotional_state: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            level: user.level,
            xp: user.xp,
            emotional_state: user.emotional_state.clone(),
        }
    }
}
