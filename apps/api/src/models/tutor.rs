use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single tutor chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AiConversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub student_emotion: Option<String>,
    pub ai_emotion: Option<String>,
    pub question_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
