use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Performance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub topic: Option<String>,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_spent_seconds: i32,
    pub mistakes: Value,
    pub cognitive_load: Option<i32>,
    pub created_at: DateTime<Utc>,
}
