use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::exams::catalog::{
    find_exam, Exam, ExamSystem, ExamType, PracticeQuestion, EXAMS, EXAM_SYSTEMS, EXAM_TYPES,
    PRACTICE_QUESTIONS,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PracticeTestRequest {
    #[serde(default)]
    pub exam_id: String,
}

#[derive(Debug, Serialize)]
pub struct PracticeTestResponse {
    pub exam_id: String,
    pub questions: [PracticeQuestion; 2],
}

/// A freshly opened exam attempt. Questions are served by the exam client.
#[derive(Debug, Serialize)]
pub struct ExamSession {
    pub exam_id: u32,
    pub session_id: Uuid,
    pub questions: Vec<PracticeQuestion>,
}

#[derive(Debug, Serialize)]
pub struct ExamTypesResponse {
    pub exam_types: [ExamType; 6],
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PerformanceAnalytics {
    pub user_id: Uuid,
    pub accuracy: f64,
    pub average_time_per_question_sec: f64,
    pub completed_tests: i64,
}

/// Derives accuracy and pace from summed quiz results.
/// Both are 0 when no questions have been answered.
pub fn performance_analytics(
    user_id: Uuid,
    completed_tests: i64,
    correct: i64,
    total: i64,
    time_spent: i64,
) -> PerformanceAnalytics {
    let (accuracy, pace) = if total > 0 {
        (
            ((correct as f64 / total as f64) * 100.0).round() / 100.0,
            ((time_spent as f64 / total as f64) * 10.0).round() / 10.0,
        )
    } else {
        (0.0, 0.0)
    };
    PerformanceAnalytics {
        user_id,
        accuracy,
        average_time_per_question_sec: pace,
        completed_tests,
    }
}

/// GET /api/system-stats
pub async fn handle_system_stats() -> Json<Value> {
    Json(json!({
        "total_answered_questions": 89_000_000,
        "active_students": 187_000,
        "uptime_percentage": 99.98,
    }))
}

/// GET /api/exam-systems
pub async fn handle_exam_systems() -> Json<[ExamSystem; 8]> {
    Json(EXAM_SYSTEMS)
}

/// GET /api/exams/types
pub async fn handle_exam_types() -> Json<ExamTypesResponse> {
    Json(ExamTypesResponse {
        exam_types: EXAM_TYPES,
    })
}

/// GET /api/stats/platform
pub async fn handle_platform_stats() -> Json<Value> {
    Json(json!({
        "active_students": 1_000_000,
        "video_lessons": 50_000,
        "solved_problems": 100_000,
        "success_rate": 99,
        "ai_sessions_today": 5_000,
        "photos_solved_today": 2_000,
    }))
}

/// POST /api/practice-test
pub async fn handle_practice_test(
    _auth: AuthUser,
    Json(req): Json<PracticeTestRequest>,
) -> Result<Json<PracticeTestResponse>, AppError> {
    let exam_id = req.exam_id.trim().to_lowercase();
    if exam_id.is_empty() {
        return Err(AppError::Validation("exam_id is required".to_string()));
    }
    Ok(Json(PracticeTestResponse {
        exam_id,
        questions: PRACTICE_QUESTIONS,
    }))
}

pub fn start_session(exam_id: u32) -> Result<ExamSession, AppError> {
    let exam = find_exam(exam_id)
        .ok_or_else(|| AppError::NotFound(format!("Exam {exam_id} not found")))?;
    Ok(ExamSession {
        exam_id: exam.id,
        session_id: Uuid::new_v4(),
        questions: Vec::new(),
    })
}

/// GET /api/exams/list
pub async fn handle_list_exams(_auth: AuthUser) -> Json<[Exam; 2]> {
    Json(EXAMS)
}

/// POST /api/exams/:exam_id/start
pub async fn handle_start_exam(
    auth: AuthUser,
    Path(exam_id): Path<u32>,
) -> Result<Json<ExamSession>, AppError> {
    let session = start_session(exam_id)?;
    info!(
        "User {} started exam {exam_id} (session {})",
        auth.user_id, session.session_id
    );
    Ok(Json(session))
}

/// GET /api/performance/:user_id
pub async fn handle_user_performance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PerformanceAnalytics>, AppError> {
    auth.ensure_self(user_id)?;

    let (count, correct, total, time_spent): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(correct_answers), 0)::BIGINT,
               COALESCE(SUM(total_questions), 0)::BIGINT,
               COALESCE(SUM(time_spent_seconds), 0)::BIGINT
        FROM performances
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(performance_analytics(
        user_id, count, correct, total, time_spent,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_analytics_empty() {
        let id = Uuid::new_v4();
        let a = performance_analytics(id, 0, 0, 0, 0);
        assert_eq!(a.accuracy, 0.0);
        assert_eq!(a.average_time_per_question_sec, 0.0);
        assert_eq!(a.completed_tests, 0);
    }

    #[test]
    fn test_performance_analytics_rounding() {
        let a = performance_analytics(Uuid::new_v4(), 3, 17, 20, 610);
        assert!((a.accuracy - 0.85).abs() < 1e-9);
        assert!((a.average_time_per_question_sec - 30.5).abs() < 1e-9);
        assert_eq!(a.completed_tests, 3);
    }

    #[test]
    fn test_start_session_for_listed_exam() {
        let a = start_session(1).unwrap();
        let b = start_session(1).unwrap();
        assert_eq!(a.exam_id, 1);
        assert!(a.questions.is_empty());
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_start_session_unknown_exam() {
        assert!(matches!(start_session(99), Err(AppError::NotFound(_))));
    }
}
