//! Reflex learning: a fixed five-stage chain with lookup tables.

use axum::{extract::Path, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ReflexStage {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
}

pub const REFLEX_CHAIN: [ReflexStage; 5] = [
    ReflexStage {
        id: 1,
        name: "İlk Maruz Kalma",
        description: "Konuyla ilk tanışma",
    },
    ReflexStage {
        id: 2,
        name: "Hatırlama Denemesi",
        description: "Kendi başına geri çağırma",
    },
    ReflexStage {
        id: 3,
        name: "Pekiştirme",
        description: "Ek örneklerle pekiştirme",
    },
    ReflexStage {
        id: 4,
        name: "Uygulama",
        description: "Problemleri çözerek uygulama",
    },
    ReflexStage {
        id: 5,
        name: "Öğretme",
        description: "Başkasına öğreterek pekiştirme",
    },
];

const STAGE_GUIDANCE: [&str; 5] = [
    "Konuya göz atarak temel kavramları öğren",
    "Ezber yerine hatırlamaya çalış, küçük sınavlar yap",
    "Ek okuma ve kaynaklarla bilgini güçlendir",
    "Soru çözerek bilgiyi pratiğe dök",
    "Başkalarına anlatarak kendi bilgin pekişsin",
];

/// Points per answered question in a stage quiz.
const POINTS_PER_ANSWER: usize = 10;

#[derive(Debug, Serialize, PartialEq)]
pub struct StageDetail {
    pub stage_id: i32,
    pub name: &'static str,
    pub description: &'static str,
    pub completion_ratio: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub answers: Map<String, Value>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QuizResult {
    pub stage_id: i32,
    pub score: usize,
    pub correct_answers: usize,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: u32,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

pub const CHALLENGES: [Challenge; 2] = [
    Challenge {
        id: 1,
        name: "Hız Okuma",
        kind: "speed_reading",
    },
    Challenge {
        id: 2,
        name: "Bellek Testi",
        kind: "memory",
    },
];

/// Stage detail for ids 1–5; anything else is `None`.
pub fn stage_detail(stage_id: i32) -> Option<StageDetail> {
    if !(1..=5).contains(&stage_id) {
        return None;
    }
    let idx = (stage_id - 1) as usize;
    Some(StageDetail {
        stage_id,
        name: REFLEX_CHAIN[idx].name,
        description: STAGE_GUIDANCE[idx],
        completion_ratio: (stage_id as f64 * 0.2 * 10.0).round() / 10.0,
    })
}

/// Answers are not checked; every submitted answer scores.
pub fn score_quiz(stage_id: i32, answer_count: usize) -> QuizResult {
    let score = answer_count * POINTS_PER_ANSWER;
    QuizResult {
        stage_id,
        score,
        correct_answers: score / POINTS_PER_ANSWER,
        total_questions: answer_count.max(1),
    }
}

/// GET /api/reflex-learning/chain
pub async fn handle_chain(_auth: AuthUser) -> Json<[ReflexStage; 5]> {
    Json(REFLEX_CHAIN)
}

/// GET /api/reflex-learning/reflex/:stage_id
pub async fn handle_stage(
    _auth: AuthUser,
    Path(stage_id): Path<i32>,
) -> Result<Json<StageDetail>, AppError> {
    stage_detail(stage_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Invalid stage id".to_string()))
}

/// POST /api/reflex-learning/quiz/:stage_id
pub async fn handle_quiz(
    _auth: AuthUser,
    Path(stage_id): Path<i32>,
    Json(req): Json<QuizRequest>,
) -> Json<QuizResult> {
    Json(score_quiz(stage_id, req.answers.len()))
}

/// GET /api/reflex/challenges
pub async fn handle_challenges(_auth: AuthUser) -> Json<[Challenge; 2]> {
    Json(CHALLENGES)
}
