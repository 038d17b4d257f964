//! Axum route handlers for the dashboard, achievements and weekly goals.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::gamification::{Achievement, WeeklyGoal};
use crate::models::performance::Performance;
use crate::models::user::User;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DashboardProfile {
    pub name: String,
    pub level: i32,
    pub xp: i32,
    pub grade_level: Option<String>,
    pub emotional_state: String,
    pub learning_style: Option<String>,
    pub streak_days: i32,
}

#[derive(Debug, Serialize)]
pub struct DashboardProgress {
    pub subject_averages: BTreeMap<String, f64>,
    pub total_quizzes: i64,
    pub videos_watched: i64,
    pub photos_solved: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub profile: DashboardProfile,
    pub progress: DashboardProgress,
    pub achievements: Vec<Value>,
    pub weekly_goals: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct AchievementListResponse {
    pub total: usize,
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAchievementRequest {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub task: String,
    pub week_start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub progress: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Pure helpers
// ────────────────────────────────────────────────────────────────────────────

/// Mean score per subject.
pub fn subject_averages(performances: &[Performance]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for perf in performances {
        let entry = sums.entry(perf.subject.clone()).or_insert((0, 0));
        entry.0 += perf.score as i64;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(subject, (total, count))| (subject, total as f64 / count as f64))
        .collect()
}

/// Monday of the week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn clamp_progress(progress: i32) -> i32 {
    progress.clamp(0, 100)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let recent = sqlx::query_as::<_, Performance>(
        "SELECT * FROM performances WHERE user_id = $1 ORDER BY created_at DESC LIMIT 10",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    let (total_quizzes, videos_watched, photos_solved): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM performances WHERE user_id = $1),
            (SELECT COUNT(*) FROM videos WHERE user_id = $1),
            (SELECT COUNT(*) FROM photo_solutions WHERE user_id = $1)
        "#,
    )
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await?;

    let achievements = sqlx::query_as::<_, Achievement>(
        "SELECT * FROM achievements WHERE user_id = $1 ORDER BY earned_at DESC LIMIT 5",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    let goals = sqlx::query_as::<_, WeeklyGoal>(
        "SELECT * FROM weekly_goals WHERE user_id = $1 AND completed = FALSE ORDER BY created_at",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DashboardResponse {
        profile: DashboardProfile {
            name: user.name,
            level: user.level,
            xp: user.xp,
            grade_level: user.grade_level,
            emotional_state: user.emotional_state,
            learning_style: user.learning_style,
            streak_days: user.streak_days,
        },
        progress: DashboardProgress {
            subject_averages: subject_averages(&recent),
            total_quizzes,
            videos_watched,
            photos_solved,
        },
        achievements: achievements
            .iter()
            .map(|a| {
                json!({
                    "name": a.name,
                    "icon": a.icon,
                    "date": a.earned_at.format("%d %B").to_string(),
                })
            })
            .collect(),
        weekly_goals: goals
            .iter()
            .map(|g| json!({ "id": g.id, "task": g.task, "progress": g.progress }))
            .collect(),
    }))
}

/// GET /api/achievements
pub async fn handle_list_achievements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AchievementListResponse>, AppError> {
    let achievements = sqlx::query_as::<_, Achievement>(
        "SELECT * FROM achievements WHERE user_id = $1 ORDER BY earned_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(AchievementListResponse {
        total: achievements.len(),
        achievements,
    }))
}

/// POST /api/achievements
pub async fn handle_create_achievement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateAchievementRequest>,
) -> Result<(StatusCode, Json<Achievement>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let achievement = sqlx::query_as::<_, Achievement>(
        r#"
        INSERT INTO achievements (user_id, name, icon, description, category)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(name)
    .bind(&req.icon)
    .bind(&req.description)
    .bind(&req.category)
    .fetch_one(&state.db)
    .await?;

    info!("User {} earned achievement '{}'", auth.user_id, achievement.name);
    Ok((StatusCode::CREATED, Json(achievement)))
}

/// GET /api/weekly-goals
pub async fn handle_list_goals(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<WeeklyGoal>>, AppError> {
    let goals = sqlx::query_as::<_, WeeklyGoal>(
        "SELECT * FROM weekly_goals WHERE user_id = $1 ORDER BY week_start DESC, created_at",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(goals))
}

/// POST /api/weekly-goals
pub async fn handle_create_goal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<WeeklyGoal>), AppError> {
    let task = req.task.trim();
    if task.is_empty() {
        return Err(AppError::Validation("task is required".to_string()));
    }
    let week_start = req
        .week_start
        .map(week_start_of)
        .unwrap_or_else(|| week_start_of(Utc::now().date_naive()));

    let goal = sqlx::query_as::<_, WeeklyGoal>(
        "INSERT INTO weekly_goals (user_id, task, week_start) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(auth.user_id)
    .bind(task)
    .bind(week_start)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// PATCH /api/weekly-goals/:id
///
/// Progress is clamped to 0–100; reaching 100 marks the goal completed.
pub async fn handle_update_goal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<Json<WeeklyGoal>, AppError> {
    let progress = clamp_progress(req.progress);

    let goal = sqlx::query_as::<_, WeeklyGoal>(
        r#"
        UPDATE weekly_goals
        SET progress = $1, completed = ($1 >= 100)
        WHERE id = $2 AND user_id = $3
        RETURNING *
        "#,
    )
    .bind(progress)
    .bind(goal_id)
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Weekly goal {goal_id} not found")))?;

    Ok(Json(goal))
}
