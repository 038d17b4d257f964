//! Axum route handlers for the adaptive-video pipeline.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::gamification::xp::{award_xp, quiz_xp, XP_VIDEO_COMPLETED};
use crate::models::video::{Video, STATUS_FAILED, STATUS_PROCESSING, STATUS_READY};
use crate::state::AppState;
use crate::storage::video_key;
use crate::video::pipeline::{load_performance, spawn_generation, GenerationJob};
use crate::video::scenario::ScoreBand;

const ESTIMATED_SECONDS: i32 = 300;
const DEFAULT_SUBJECT: &str = "Genel";
const RECENT_VIDEOS: i64 = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuizCompletedRequest {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_spent: Option<i32>,
    pub mistakes: Option<Value>,
    pub cognitive_load: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct QuizCompletedResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub video_id: Uuid,
    pub performance_id: Uuid,
    pub xp_awarded: i32,
    pub estimated_time: i32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topic: Option<String>,
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub video_id: Uuid,
    pub message: &'static str,
    pub estimated_time: i32,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub total: usize,
    pub videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsRequest {
    pub watch_duration: i32,
    pub watch_percentage: i32,
    pub pause_timestamps: Option<Value>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub xp_awarded: i32,
}

#[derive(Debug, Deserialize)]
pub struct HeyGenWebhook {
    pub video_id: Option<String>,
    pub status: Option<String>,
    pub download_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecentVideo {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: String,
    pub watched: bool,
}

#[derive(Debug, Serialize)]
pub struct VideoDashboardResponse {
    pub total_videos: i64,
    pub total_watch_time: i64,
    pub completion_rate: i64,
    pub streak_days: i64,
    pub recent_videos: Vec<RecentVideo>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn lesson_title(topic: &str, n: i64) -> String {
    format!("{topic} - Kişisel Ders #{n}")
}

pub fn validate_quiz(req: &QuizCompletedRequest) -> Result<(), AppError> {
    if !(0..=100).contains(&req.score) {
        return Err(AppError::Validation("score must be between 0 and 100".to_string()));
    }
    if req.total_questions < 0 || req.correct_answers < 0 {
        return Err(AppError::Validation(
            "question counts must not be negative".to_string(),
        ));
    }
    if req.correct_answers > req.total_questions {
        return Err(AppError::Validation(
            "correct_answers cannot exceed total_questions".to_string(),
        ));
    }
    if req.cognitive_load.is_some_and(|c| !(0..=100).contains(&c)) {
        return Err(AppError::Validation(
            "cognitive_load must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// What a provider callback does to the matching video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    /// Store the URL (mirrored when storage is configured) and mark `ready`.
    Ready(String),
    Failed,
    Ignore,
}

/// A completed render without a download URL has nothing to store.
pub fn webhook_action(status: &str, download_url: Option<String>) -> WebhookAction {
    match (status, download_url) {
        ("completed", Some(url)) => WebhookAction::Ready(url),
        ("failed", _) => WebhookAction::Failed,
        _ => WebhookAction::Ignore,
    }
}

/// Completed sessions as an integer percentage of all sessions.
pub fn completion_rate(completed: i64, sessions: i64) -> i64 {
    if sessions <= 0 {
        return 0;
    }
    (completed * 100) / sessions
}

/// Consecutive days with watch activity, ending today or yesterday.
pub fn streak_days(active_days: &[NaiveDate], today: NaiveDate) -> i64 {
    let days: HashSet<NaiveDate> = active_days.iter().copied().collect();
    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/video/quiz-completed
///
/// Records the attempt, opens a `processing` video and awards the quiz XP in
/// one transaction, then starts generation in the background.
pub async fn handle_quiz_completed(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<QuizCompletedRequest>,
) -> Result<Json<QuizCompletedResponse>, AppError> {
    validate_quiz(&req)?;

    let subject = non_blank(req.subject.as_deref()).unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let topic = non_blank(req.topic.as_deref()).unwrap_or_else(|| subject.clone());
    let band = ScoreBand::for_score(req.score as f64);
    let xp = quiz_xp(req.score);

    let mut tx = state.db.begin().await?;

    let performance_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO performances
            (user_id, subject, topic, score, correct_answers, total_questions,
             time_spent_seconds, mistakes, cognitive_load)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(auth.user_id)
    .bind(&subject)
    .bind(&topic)
    .bind(req.score)
    .bind(req.correct_answers)
    .bind(req.total_questions)
    .bind(req.time_spent.unwrap_or(0).max(0))
    .bind(req.mistakes.unwrap_or_else(|| json!([])))
    .bind(req.cognitive_load)
    .fetch_one(&mut *tx)
    .await?;

    let previous: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE user_id = $1")
        .bind(auth.user_id)
        .fetch_one(&mut *tx)
        .await?;

    let video_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO videos (user_id, title, duration_seconds, topic, difficulty, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(auth.user_id)
    .bind(lesson_title(&topic, previous + 1))
    .bind(band.target_seconds)
    .bind(&topic)
    .bind(band.difficulty)
    .bind(STATUS_PROCESSING)
    .fetch_one(&mut *tx)
    .await?;

    award_xp(&mut *tx, auth.user_id, xp)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tx.commit().await?;

    info!(
        "Quiz recorded for user {} (score={}), video {video_id} queued",
        auth.user_id, req.score
    );

    spawn_generation(
        state.clone(),
        GenerationJob {
            video_id,
            user_id: auth.user_id,
            topic,
        },
    );

    Ok(Json(QuizCompletedResponse {
        status: "success",
        message: "Quiz kaydedildi, video hazırlanıyor",
        video_id,
        performance_id,
        xp_awarded: xp,
        estimated_time: ESTIMATED_SECONDS,
    }))
}

/// POST /api/video/generate
///
/// Reuses a video still processing for the same topic unless
/// `force_regenerate` is set. The check and the insert run under a lock on
/// the caller's user row, so concurrent calls cannot both start a video.
pub async fn handle_generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let topic = match non_blank(req.topic.as_deref()) {
        Some(t) => t,
        None => sqlx::query_scalar::<_, Option<String>>(
            "SELECT topic FROM performances WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(auth.user_id)
        .fetch_optional(&state.db)
        .await?
        .flatten()
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
    };

    let performance = load_performance(&state.db, auth.user_id, &topic).await?;
    let band = ScoreBand::for_score(performance.average_score);

    let mut tx = state.db.begin().await?;

    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(auth.user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if !req.force_regenerate {
        let pending: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM videos
            WHERE user_id = $1 AND topic = $2 AND status = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(auth.user_id)
        .bind(&topic)
        .bind(STATUS_PROCESSING)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(video_id) = pending {
            debug!("Reusing pending video {video_id} for topic '{topic}'");
            return Ok(Json(GenerateResponse {
                status: STATUS_PROCESSING,
                video_id,
                message: "Video üretimi zaten devam ediyor",
                estimated_time: ESTIMATED_SECONDS,
            }));
        }
    }

    let previous: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE user_id = $1")
        .bind(auth.user_id)
        .fetch_one(&mut *tx)
        .await?;

    let video_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO videos (user_id, title, duration_seconds, topic, difficulty, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(auth.user_id)
    .bind(lesson_title(&topic, previous + 1))
    .bind(band.target_seconds)
    .bind(&topic)
    .bind(band.difficulty)
    .bind(STATUS_PROCESSING)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    spawn_generation(
        state.clone(),
        GenerationJob {
            video_id,
            user_id: auth.user_id,
            topic,
        },
    );

    Ok(Json(GenerateResponse {
        status: STATUS_PROCESSING,
        video_id,
        message: "Video üretimi başlatıldı",
        estimated_time: ESTIMATED_SECONDS,
    }))
}

/// GET /api/video/list
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<VideoListResponse>, AppError> {
    let videos = sqlx::query_as::<_, Video>(
        "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(VideoListResponse {
        total: videos.len(),
        videos,
    }))
}

/// GET /api/video/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<Json<Video>, AppError> {
    let video = sqlx::query_as::<_, Video>(
        r#"
        UPDATE videos
        SET view_count = view_count + 1
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(video_id)
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Video {video_id} not found")))?;

    Ok(Json(video))
}

/// POST /api/video/:id/analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<Uuid>,
    Json(req): Json<AnalyticsRequest>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    if req.watch_duration < 0 {
        return Err(AppError::Validation(
            "watch_duration must not be negative".to_string(),
        ));
    }
    if !(0..=100).contains(&req.watch_percentage) {
        return Err(AppError::Validation(
            "watch_percentage must be between 0 and 100".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let owned: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM videos WHERE id = $1 AND user_id = $2")
            .bind(video_id)
            .bind(auth.user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(format!("Video {video_id} not found")));
    }

    sqlx::query(
        r#"
        INSERT INTO video_analytics
            (video_id, user_id, watch_duration, watch_percentage, pause_timestamps, completed)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(video_id)
    .bind(auth.user_id)
    .bind(req.watch_duration)
    .bind(req.watch_percentage)
    .bind(req.pause_timestamps.unwrap_or_else(|| json!([])))
    .bind(req.completed)
    .execute(&mut *tx)
    .await?;

    let xp_awarded = if req.completed {
        award_xp(&mut *tx, auth.user_id, XP_VIDEO_COMPLETED).await?;
        XP_VIDEO_COMPLETED
    } else {
        0
    };

    tx.commit().await?;

    Ok(Json(AnalyticsResponse {
        status: "success",
        message: "Analitik kaydedildi",
        xp_awarded,
    }))
}

/// POST /api/video/webhook/heygen
///
/// Provider callback. Always acknowledged; unknown ids are only logged.
pub async fn handle_heygen_webhook(
    State(state): State<AppState>,
    Json(payload): Json<HeyGenWebhook>,
) -> Result<Json<Value>, AppError> {
    let received = Json(json!({ "status": "received" }));

    let Some(provider_id) = non_blank(payload.video_id.as_deref()) else {
        warn!("HeyGen webhook without video_id ignored");
        return Ok(received);
    };
    let status = payload.status.as_deref().unwrap_or_default();
    let action = webhook_action(status, non_blank(payload.download_url.as_deref()));
    if action == WebhookAction::Ignore {
        debug!("HeyGen webhook status '{status}' for {provider_id} needs no action");
        return Ok(received);
    }

    let video: Option<(Uuid, Uuid)> =
        sqlx::query_as("SELECT id, user_id FROM videos WHERE provider_video_id = $1")
            .bind(&provider_id)
            .fetch_optional(&state.db)
            .await?;
    let Some((video_id, user_id)) = video else {
        warn!("HeyGen webhook for unknown provider id {provider_id} (status={status})");
        return Ok(received);
    };

    match action {
        WebhookAction::Ready(download_url) => {
            let video_url = match &state.storage {
                Some(store) => match store
                    .mirror(&download_url, &video_key(user_id, video_id), "video/mp4")
                    .await
                {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Mirroring video {video_id} failed, keeping provider URL: {e:#}");
                        download_url
                    }
                },
                None => download_url,
            };

            sqlx::query(
                "UPDATE videos SET video_url = $2, status = $3, updated_at = NOW() WHERE id = $1",
            )
            .bind(video_id)
            .bind(&video_url)
            .bind(STATUS_READY)
            .execute(&state.db)
            .await?;
            info!("Video {video_id} ready at {video_url}");
        }
        WebhookAction::Failed => {
            sqlx::query("UPDATE videos SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(video_id)
                .bind(STATUS_FAILED)
                .execute(&state.db)
                .await?;
            warn!("Provider reported render failure for video {video_id}");
        }
        WebhookAction::Ignore => {}
    }

    Ok(received)
}

/// GET /api/video/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<VideoDashboardResponse>, AppError> {
    let total_videos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE user_id = $1")
        .bind(auth.user_id)
        .fetch_one(&state.db)
        .await?;

    let (total_watch_time, sessions, completed): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(watch_duration), 0)::BIGINT,
               COUNT(*),
               COUNT(*) FILTER (WHERE completed)
        FROM video_analytics
        WHERE user_id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await?;

    let active_days: Vec<NaiveDate> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT (created_at AT TIME ZONE 'UTC')::DATE
        FROM video_analytics
        WHERE user_id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    let recent: Vec<(Uuid, String, String, chrono::DateTime<Utc>, bool)> = sqlx::query_as(
        r#"
        SELECT v.id, v.title, v.status, v.created_at,
               EXISTS (
                   SELECT 1 FROM video_analytics a
                   WHERE a.video_id = v.id AND a.user_id = v.user_id
               ) AS watched
        FROM videos v
        WHERE v.user_id = $1
        ORDER BY v.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(auth.user_id)
    .bind(RECENT_VIDEOS)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(VideoDashboardResponse {
        total_videos,
        total_watch_time,
        completion_rate: completion_rate(completed, sessions),
        streak_days: streak_days(&active_days, Utc::now().date_naive()),
        recent_videos: recent
            .into_iter()
            .map(|(id, title, status, created_at, watched)| RecentVideo {
                id,
                title,
                status,
                created_at: created_at.to_rfc3339(),
                watched,
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(score: i32, correct: i32, total: i32) -> QuizCompletedRequest {
        QuizCompletedRequest {
            subject: None,
            topic: None,
            score,
            correct_answers: correct,
            total_questions: total,
            time_spent: None,
            mistakes: None,
            cognitive_load: None,
        }
    }

    #[test]
    fn test_lesson_title() {
        assert_eq!(lesson_title("Türev", 3), "Türev - Kişisel Ders #3");
    }

    #[test]
    fn test_validate_quiz() {
        assert!(validate_quiz(&quiz(52, 13, 25)).is_ok());
        assert!(validate_quiz(&quiz(101, 13, 25)).is_err());
        assert!(validate_quiz(&quiz(-1, 0, 0)).is_err());
        assert!(validate_quiz(&quiz(50, 26, 25)).is_err());
        let mut req = quiz(50, 10, 20);
        req.cognitive_load = Some(150);
        assert!(validate_quiz(&req).is_err());
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(2, 3), 66);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let days = vec![
            today,
            today - Duration::days(1),
            today - Duration::days(2),
            today - Duration::days(4),
        ];
        assert_eq!(streak_days(&days, today), 3);
    }

    #[test]
    fn test_streak_survives_until_end_of_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let days = vec![today - Duration::days(1), today - Duration::days(2)];
        assert_eq!(streak_days(&days, today), 2);
        assert_eq!(streak_days(&[today - Duration::days(3)], today), 0);
        assert_eq!(streak_days(&[], today), 0);
    }

    #[test]
    fn test_webhook_completed_with_url_marks_ready() {
        assert_eq!(
            webhook_action("completed", Some("https://cdn.heygen.com/v.mp4".to_string())),
            WebhookAction::Ready("https://cdn.heygen.com/v.mp4".to_string())
        );
    }

    #[test]
    fn test_webhook_completed_without_url_is_ignored() {
        assert_eq!(webhook_action("completed", None), WebhookAction::Ignore);
    }

    #[test]
    fn test_webhook_failed_marks_failed() {
        assert_eq!(webhook_action("failed", None), WebhookAction::Failed);
        assert_eq!(
            webhook_action("failed", Some("https://cdn.heygen.com/v.mp4".to_string())),
            WebhookAction::Failed
        );
    }

    #[test]
    fn test_webhook_other_statuses_are_ignored() {
        assert_eq!(webhook_action("processing", None), WebhookAction::Ignore);
        assert_eq!(webhook_action("", None), WebhookAction::Ignore);
    }
}
