use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhotoSolution {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: Option<String>,
    pub problem_text: String,
    pub problem_type: Option<String>,
    pub solution_steps: Value,
    pub explanation: Option<String>,
    pub difficulty: Option<String>,
    pub time_spent: Option<i32>,
    pub created_at: DateTime<Utc>,
}
