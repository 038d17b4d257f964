//! Axum route handlers for registration, login and the user profile.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::{jwt::issue_token, password, AuthUser};
use crate::errors::AppError;
use crate::models::user::{User, UserSummary};
use crate::state::AppState;

/// Lessons in a learning track; progress is reported against this.
const LESSONS_PER_TRACK: i64 = 10;

const DEFAULT_EXAM_TYPE: &str = "YKS";
const DEFAULT_GRADE_LEVEL: &str = "11. Sınıf";
const DEFAULT_LEARNING_STYLE: &str = "Görsel";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub exam_type: Option<String>,
    pub grade_level: Option<String>,
    pub learning_style: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub user_id: Uuid,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub mastery_level: f64,
}

#[derive(Debug, Serialize)]
pub struct ProgressEcho {
    pub user_id: Uuid,
    pub progress: Value,
}

#[derive(Debug, Serialize)]
pub struct UserAchievementsResponse {
    pub user_id: Uuid,
    pub badges: Vec<String>,
    pub points: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Pure helpers
// ────────────────────────────────────────────────────────────────────────────

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Returns the trimmed value, or `None` when absent or blank.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A validated registration, ready to insert.
#[derive(Debug, PartialEq)]
pub struct NewUser {
    pub name: String,
    /// Lower-cased and trimmed, so the unique index sees one spelling.
    pub email: String,
    pub password: String,
    pub exam_type: String,
    pub grade_level: String,
    pub learning_style: String,
}

pub fn new_user_params(req: &RegisterRequest) -> Result<NewUser, AppError> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(req.name.as_deref()),
        non_blank(req.email.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "name, email and password are required".to_string(),
        ));
    };

    Ok(NewUser {
        name: name.to_string(),
        email: normalize_email(email),
        password: password.to_string(),
        exam_type: non_blank(req.exam_type.as_deref())
            .unwrap_or(DEFAULT_EXAM_TYPE)
            .to_string(),
        grade_level: non_blank(req.grade_level.as_deref())
            .unwrap_or(DEFAULT_GRADE_LEVEL)
            .to_string(),
        learning_style: non_blank(req.learning_style.as_deref())
            .unwrap_or(DEFAULT_LEARNING_STYLE)
            .to_string(),
    })
}

/// Summarises quiz history as lesson progress. Mastery is the average
/// score as a 0–1 fraction, rounded to 2 decimals.
pub fn progress_summary(completed: i64, average_score: Option<f64>) -> (i64, i64, f64) {
    let total = LESSONS_PER_TRACK.max(completed);
    let mastery = average_score
        .map(|s| ((s / 100.0).clamp(0.0, 1.0) * 100.0).round() / 100.0)
        .unwrap_or(0.0);
    (completed, total, mastery)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let new_user = new_user_params(&req)?;
    let password_hash = password::hash_password(new_user.password).await?;

    // ON CONFLICT keeps the uniqueness check and the insert in one statement.
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, exam_type, grade_level, learning_style)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&password_hash)
    .bind(&new_user.exam_type)
    .bind(&new_user.grade_level)
    .bind(&new_user.learning_style)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Conflict("User with this email already exists".to_string()))?;

    info!("Registered user {}", user.id);

    let token = issue_token(&state.config.jwt_secret, user.id, state.config.jwt_expiry_days)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let email = non_blank(req.email.as_deref())
        .map(normalize_email)
        .ok_or_else(invalid)?;
    let password = req.password.ok_or_else(invalid)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = issue_token(&state.config.jwt_secret, user.id, state.config.jwt_expiry_days)?;
    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// GET /api/users/profile
pub async fn handle_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// GET /api/users/:user_id/progress
pub async fn handle_get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProgressResponse>, AppError> {
    auth.ensure_self(user_id)?;

    let (count, average): (i64, Option<f64>) = sqlx::query_as(
        "SELECT COUNT(*), AVG(score)::FLOAT8 FROM performances WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    let (completed_lessons, total_lessons, mastery_level) = progress_summary(count, average);
    Ok(Json(ProgressResponse {
        user_id,
        completed_lessons,
        total_lessons,
        mastery_level,
    }))
}

/// POST /api/users/:user_id/progress
///
/// Echoes the payload back; progress is derived from quiz history, not stored.
pub async fn handle_post_progress(
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(progress): Json<Value>,
) -> Result<Json<ProgressEcho>, AppError> {
    auth.ensure_self(user_id)?;
    Ok(Json(ProgressEcho { user_id, progress }))
}

/// GET /api/users/:user_id/achievements
pub async fn handle_user_achievements(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserAchievementsResponse>, AppError> {
    auth.ensure_self(user_id)?;

    let points: i32 = sqlx::query_scalar("SELECT xp FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let badges: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM achievements WHERE user_id = $1 ORDER BY earned_at",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(UserAchievementsResponse {
        user_id,
        badges,
        points,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ali@Example.COM "), "ali@example.com");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_progress_summary_without_history() {
        assert_eq!(progress_summary(0, None), (0, 10, 0.0));
    }

    #[test]
    fn test_progress_summary_with_history() {
        let (completed, total, mastery) = progress_summary(4, Some(52.345));
        assert_eq!(completed, 4);
        assert_eq!(total, 10);
        assert!((mastery - 0.52).abs() < 1e-9);
    }

    #[test]
    fn test_progress_total_grows_past_track() {
        assert_eq!(progress_summary(14, Some(100.0)).1, 14);
    }

    fn register(name: Option<&str>, email: Option<&str>, password: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            exam_type: None,
            grade_level: None,
            learning_style: None,
        }
    }

    #[test]
    fn test_new_user_normalizes_before_insert() {
        let req = register(Some("  Elif "), Some("  Elif@Example.COM "), Some(" gizli123 "));
        let user = new_user_params(&req).unwrap();
        assert_eq!(user.email, "elif@example.com");
        assert_eq!(user.name, "Elif");
        // Passwords are taken verbatim.
        assert_eq!(user.password, " gizli123 ");
        assert_eq!(user.exam_type, DEFAULT_EXAM_TYPE);
        assert_eq!(user.grade_level, DEFAULT_GRADE_LEVEL);
        assert_eq!(user.learning_style, DEFAULT_LEARNING_STYLE);
    }

    #[test]
    fn test_new_user_keeps_given_profile() {
        let mut req = register(Some("Can"), Some("can@example.com"), Some("pw"));
        req.exam_type = Some(" LGS ".to_string());
        req.grade_level = Some("8. Sınıf".to_string());
        req.learning_style = Some("   ".to_string());
        let user = new_user_params(&req).unwrap();
        assert_eq!(user.exam_type, "LGS");
        assert_eq!(user.grade_level, "8. Sınıf");
        assert_eq!(user.learning_style, DEFAULT_LEARNING_STYLE);
    }

    #[test]
    fn test_new_user_requires_credentials() {
        for req in [
            register(None, Some("a@b.c"), Some("pw")),
            register(Some("A"), Some("   "), Some("pw")),
            register(Some("A"), Some("a@b.c"), Some("")),
        ] {
            assert!(matches!(new_user_params(&req), Err(AppError::Validation(_))));
        }
    }
}
