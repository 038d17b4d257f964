//! Axum route handlers for the photo solver.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::gamification::xp::{award_xp, XP_PHOTO_SOLVE};
use crate::models::photo::PhotoSolution;
use crate::photo::solution::{solve, Solution};
use crate::state::AppState;
use crate::storage::{photo_key, ObjectStore};

const HISTORY_LIMIT: i64 = 20;
const STARTING_CREDITS: i64 = 10;

const DIFFICULTIES: [&str; 3] = ["kolay", "orta", "zor"];
const SUBJECTS: [&str; 4] = ["matematik", "fizik", "kimya", "biyoloji"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// A single file pulled out of a multipart body.
#[derive(Debug)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub filename: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetailedAnalysisResponse {
    pub filename: Option<String>,
    pub text: String,
    pub difficulty: &'static str,
    pub subject: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    pub problem: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EarnCreditsRequest {
    pub user_id: Option<Value>,
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SolveResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub solution: Solution,
    pub image_url: Option<String>,
    pub xp_awarded: i32,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub problem_text: String,
    pub problem_type: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub total: usize,
    pub solutions: Vec<HistoryItem>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads the multipart body and returns the field named `field`, if any.
pub async fn read_upload(multipart: &mut Multipart, field: &str) -> Result<Option<Upload>, AppError> {
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let filename = part.file_name().map(str::to_string);
        let content_type = part.content_type().map(str::to_string);
        let data = part.bytes().await?;
        return Ok(Some(Upload {
            filename,
            content_type,
            data,
        }));
    }
    Ok(None)
}

pub fn credit_balance(amount: Option<i64>) -> Result<i64, AppError> {
    STARTING_CREDITS
        .checked_add(amount.unwrap_or(1))
        .ok_or_else(|| AppError::Validation("amount is out of range".to_string()))
}

/// Object key for a solved photo. Keyed by the committed solution id, so
/// the upload can only happen once the row exists.
pub fn image_key(user_id: Uuid, solution_id: Uuid, upload: &Upload) -> String {
    photo_key(user_id, solution_id, upload.filename.as_deref())
}

async fn required_upload(multipart: &mut Multipart, field: &str) -> Result<Upload, AppError> {
    read_upload(multipart, field)
        .await?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/photo-solver/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let upload = required_upload(&mut multipart, "file").await?;
    let text = state
        .ocr
        .extract_text(upload.data, upload.content_type.as_deref())
        .await;
    Ok(Json(AnalyzeResponse {
        filename: upload.filename,
        text,
    }))
}

/// POST /api/photo-solver/detailed-analysis
pub async fn handle_detailed_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetailedAnalysisResponse>, AppError> {
    let upload = required_upload(&mut multipart, "file").await?;
    let text = state
        .ocr
        .extract_text(upload.data, upload.content_type.as_deref())
        .await;

    let (difficulty, subject) = {
        let mut rng = rand::thread_rng();
        (
            DIFFICULTIES.choose(&mut rng).copied().unwrap_or("orta"),
            SUBJECTS.choose(&mut rng).copied().unwrap_or("matematik"),
        )
    };

    Ok(Json(DetailedAnalysisResponse {
        filename: upload.filename,
        text,
        difficulty,
        subject,
    }))
}

/// POST /api/photo-solver/generate-video
pub async fn handle_generate_video(Json(req): Json<GenerateVideoRequest>) -> Json<Value> {
    let problem = req
        .problem
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("Bilinmeyen sorun");
    Json(json!({
        "success": true,
        "video_url": "https://example.com/videos/dummy.mp4",
        "description": format!("Video explanation for: {problem}"),
    }))
}

/// POST /api/photo-solver/earn-credits
///
/// Credits are not persisted; the balance is illustrative.
pub async fn handle_earn_credits(
    Json(req): Json<EarnCreditsRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = req
        .user_id
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let balance = credit_balance(req.amount)?;
    Ok(Json(json!({
        "user_id": user_id,
        "new_credit_balance": balance,
    })))
}

/// POST /api/photo-solver/solve
///
/// Records the solution and awards XP in one transaction. The image is
/// stored afterwards (when S3 is configured) so a failed insert leaves no
/// object behind.
pub async fn handle_solve(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<SolveResponse>, AppError> {
    let upload = read_upload(&mut multipart, "image")
        .await?
        .ok_or_else(|| AppError::Validation("Fotoğraf yüklenmedi".to_string()))?;

    let text = state
        .ocr
        .extract_text(upload.data.clone(), upload.content_type.as_deref())
        .await;
    let solution = solve(&text);

    let mut tx = state.db.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO photo_solutions
            (user_id, problem_text, problem_type, solution_steps, explanation, difficulty)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(auth.user_id)
    .bind(&solution.problem_text)
    .bind(solution.problem_type)
    .bind(serde_json::to_value(&solution.steps).map_err(anyhow::Error::from)?)
    .bind(solution.explanation)
    .bind(solution.difficulty)
    .fetch_one(&mut *tx)
    .await?;

    award_xp(&mut *tx, auth.user_id, XP_PHOTO_SOLVE)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tx.commit().await?;

    info!("Stored photo solution {id} for user {}", auth.user_id);

    let image_url = match &state.storage {
        Some(store) => attach_image(&state, store, auth.user_id, id, &upload).await,
        None => None,
    };

    Ok(Json(SolveResponse {
        id,
        solution,
        image_url,
        xp_awarded: XP_PHOTO_SOLVE,
    }))
}

/// Uploads the photo under the solution's id and records its URL. Failures
/// are logged; the solution stays without an image.
async fn attach_image(
    state: &AppState,
    store: &ObjectStore,
    user_id: Uuid,
    solution_id: Uuid,
    upload: &Upload,
) -> Option<String> {
    let key = image_key(user_id, solution_id, upload);
    let content_type = upload
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let url = match store.put(&key, upload.data.clone(), content_type).await {
        Ok(url) => url,
        Err(e) => {
            warn!("Photo upload failed for solution {solution_id}: {e:#}");
            return None;
        }
    };

    match sqlx::query("UPDATE photo_solutions SET image_url = $2 WHERE id = $1")
        .bind(solution_id)
        .bind(&url)
        .execute(&state.db)
        .await
    {
        Ok(_) => Some(url),
        Err(e) => {
            warn!("Could not record image_url for solution {solution_id}: {e}");
            None
        }
    }
}

/// GET /api/photo-solver/history
pub async fn handle_history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<HistoryResponse>, AppError> {
    let rows = sqlx::query_as::<_, PhotoSolution>(
        "SELECT * FROM photo_solutions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(auth.user_id)
    .bind(HISTORY_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let solutions: Vec<HistoryItem> = rows
        .into_iter()
        .map(|s| HistoryItem {
            id: s.id,
            problem_text: s.problem_text,
            problem_type: s.problem_type,
            difficulty: s.difficulty,
            created_at: s.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(HistoryResponse {
        total: solutions.len(),
        solutions,
    }))
}
