use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_READY: &str = "ready";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub scenario_metadata: Value,
    pub status: String,
    pub provider_video_id: Option<String>,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One watch session reported by the player.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoAnalytics {
    pub id: Uuid,
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub watch_duration: i32,
    pub watch_percentage: i32,
    pub pause_timestamps: Value,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}
