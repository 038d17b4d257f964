//! Teacher-facing assistant endpoints. All responses are canned or random.

use axum::Json;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;

const DEFAULT_QUESTION_COUNT: i64 = 3;
const MAX_QUESTION_COUNT: i64 = 20;
const ANSWER_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LessonPlanRequest {
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonPlan {
    pub subject: String,
    pub outline: [&'static str; 4],
    pub objectives: Vec<String>,
    pub activities: [&'static str; 3],
}

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    pub topic: Option<String>,
    pub count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: [&'static str; 4],
    pub answer: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QuestionSet {
    pub topic: String,
    pub questions: Vec<GeneratedQuestion>,
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

pub fn lesson_plan(subject: Option<&str>) -> LessonPlan {
    let subject = or_default(subject, "belirsiz konu");
    LessonPlan {
        objectives: vec![format!("Öğrenciler {subject} temel kavramlarını tanımlar")],
        subject,
        outline: ["Tanıtım", "Kavramlar", "Uygulama", "Değerlendirme"],
        activities: ["Grup çalışması", "Soru-cevap", "Sunum"],
    }
}

pub fn generate_questions<R: Rng + ?Sized>(
    rng: &mut R,
    topic: Option<&str>,
    count: Option<i64>,
) -> QuestionSet {
    let topic = or_default(topic, "genel konu");
    let count = count
        .unwrap_or(DEFAULT_QUESTION_COUNT)
        .clamp(1, MAX_QUESTION_COUNT);
    let questions = (1..=count)
        .map(|i| GeneratedQuestion {
            id: i,
            prompt: format!("{topic} hakkında soru {i}"),
            options: ANSWER_LETTERS,
            answer: ANSWER_LETTERS.choose(rng).copied().unwrap_or("A"),
        })
        .collect();
    QuestionSet { topic, questions }
}

/// GET /api/vizyon/stats
pub async fn handle_stats(_auth: AuthUser) -> Json<Value> {
    Json(json!({
        "registered_teachers": 47_000,
        "lesson_plans_generated": 12_345,
        "questions_generated": 56_789,
    }))
}

/// POST /api/vizyon/chat
pub async fn handle_chat(
    _auth: AuthUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }
    Ok(Json(json!({
        "reply": format!(
            "Öğretmen sorunuz alındı: {message}. Size yardımcı olmaktan mutluluk duyarım!"
        )
    })))
}

/// POST /api/vizyon/lesson-plan/generate
pub async fn handle_lesson_plan(
    _auth: AuthUser,
    Json(req): Json<LessonPlanRequest>,
) -> Json<LessonPlan> {
    Json(lesson_plan(req.subject.as_deref()))
}

/// POST /api/vizyon/questions/generate
pub async fn handle_questions(
    _auth: AuthUser,
    Json(req): Json<QuestionsRequest>,
) -> Json<QuestionSet> {
    Json(generate_questions(
        &mut rand::thread_rng(),
        req.topic.as_deref(),
        req.count,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_lesson_plan_defaults_subject() {
        let plan = lesson_plan(Some("   "));
        assert_eq!(plan.subject, "belirsiz konu");
        assert_eq!(plan.objectives.len(), 1);
    }

    #[test]
    fn test_questions_default_count() {
        let mut rng = StdRng::seed_from_u64(3);
        let set = generate_questions(&mut rng, Some("Türev"), None);
        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.questions[0].prompt, "Türev hakkında soru 1");
        assert!(set
            .questions
            .iter()
            .all(|q| ANSWER_LETTERS.contains(&q.answer)));
    }

    #[test]
    fn test_questions_count_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(generate_questions(&mut rng, None, Some(0)).questions.len(), 1);
        assert_eq!(
            generate_questions(&mut rng, None, Some(500)).questions.len(),
            20
        );
    }
}
