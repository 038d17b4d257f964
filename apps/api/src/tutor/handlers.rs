use std::collections::BTreeMap;

use axum::{extract::State, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::tutor::AiConversation;
use crate::state::AppState;
use crate::tutor::personality::{
    guess_emotion, personality_reply, socratic_turn, EmotionGuess, Personality, PersonalityId,
    EMOTIONS, PERSONALITIES, TUTOR_TIPS,
};

/// Turns returned by the session history endpoint.
const SESSION_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct PersonalityChatRequest {
    #[serde(default)]
    pub message: String,
    pub personality: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PersonalityChatResponse {
    pub reply: String,
    pub personality: PersonalityId,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
    pub voice: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    pub success: bool,
    pub mime: &'static str,
    pub audio_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TutorChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TutorChatResponse {
    pub message: &'static str,
    pub emotion: &'static str,
    pub question_type: &'static str,
    pub session_id: String,
    pub student_emotion: &'static str,
    pub tips: [&'static str; 3],
}

#[derive(Debug, Serialize)]
pub struct SessionTurn {
    pub message: String,
    pub response: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub total_sessions: usize,
    pub sessions: BTreeMap<String, Vec<SessionTurn>>,
}

/// GET /api/ai-personality/personalities
pub async fn handle_personalities() -> Json<[Personality; 4]> {
    Json(PERSONALITIES)
}

/// GET /api/ai-personality/emotions
pub async fn handle_emotions() -> Json<[&'static str; 6]> {
    Json(EMOTIONS)
}

/// GET /api/ai-personality/stats
pub async fn handle_stats() -> Json<Value> {
    Json(json!({
        "active_sessions": 42,
        "messages_today": 1234,
        "average_response_time_ms": 400,
    }))
}

/// POST /api/ai-personality/chat
pub async fn handle_personality_chat(
    Json(req): Json<PersonalityChatRequest>,
) -> Result<Json<PersonalityChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }
    let personality = PersonalityId::parse(req.personality.as_deref().unwrap_or("empathetic"));
    Ok(Json(PersonalityChatResponse {
        reply: personality_reply(personality, message),
        personality,
    }))
}

/// POST /api/ai-personality/voice/synthesize
///
/// Proxies OpenAI speech synthesis. Without an API key the endpoint is
/// unavailable.
pub async fn handle_synthesize(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Json<SynthesizeResponse>, AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Text is required".to_string()));
    }

    let llm = state
        .llm
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("TTS is unavailable: no API key configured".into()))?;

    let model = req
        .model
        .as_deref()
        .unwrap_or(state.config.openai_tts_model.as_str());
    let voice = req
        .voice
        .as_deref()
        .unwrap_or(state.config.openai_tts_voice.as_str());

    let audio = llm
        .synthesize_speech(text, model, voice)
        .await
        .map_err(|e| {
            warn!("Speech synthesis failed: {e}");
            AppError::Upstream(format!("speech synthesis failed: {e}"))
        })?;

    Ok(Json(SynthesizeResponse {
        success: true,
        mime: "audio/mpeg",
        audio_base64: STANDARD.encode(&audio),
    }))
}

/// POST /api/ai-personality/emotion/analyze
pub async fn handle_analyze_emotion(
    Json(req): Json<TextRequest>,
) -> Result<Json<EmotionGuess>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("Text is required".to_string()));
    }
    Ok(Json(guess_emotion(&mut rand::thread_rng())))
}

/// POST /api/ai-tutor/chat
pub async fn handle_tutor_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TutorChatRequest>,
) -> Result<Json<TutorChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("session-{}-{}", auth.user_id, Utc::now().timestamp()));

    let prior_turns: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ai_conversations WHERE user_id = $1 AND session_id = $2",
    )
    .bind(auth.user_id)
    .bind(&session_id)
    .fetch_one(&state.db)
    .await?;

    let turn = socratic_turn(prior_turns);
    let student_emotion = "neutral";

    sqlx::query(
        r#"
        INSERT INTO ai_conversations
            (user_id, session_id, message, response, student_emotion, ai_emotion, question_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(auth.user_id)
    .bind(&session_id)
    .bind(message)
    .bind(turn.message)
    .bind(student_emotion)
    .bind(turn.emotion)
    .bind(turn.question_type)
    .execute(&state.db)
    .await?;

    info!(
        "Tutor turn {} ({}) for user {} in {session_id}",
        prior_turns + 1,
        turn.question_type,
        auth.user_id
    );

    Ok(Json(TutorChatResponse {
        message: turn.message,
        emotion: turn.emotion,
        question_type: turn.question_type,
        session_id,
        student_emotion,
        tips: TUTOR_TIPS,
    }))
}

/// GET /api/ai-tutor/sessions
pub async fn handle_tutor_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SessionsResponse>, AppError> {
    let turns = sqlx::query_as::<_, AiConversation>(
        "SELECT * FROM ai_conversations WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(auth.user_id)
    .bind(SESSION_HISTORY_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let sessions = group_by_session(turns);
    Ok(Json(SessionsResponse {
        total_sessions: sessions.len(),
        sessions,
    }))
}

fn group_by_session(turns: Vec<AiConversation>) -> BTreeMap<String, Vec<SessionTurn>> {
    let mut sessions: BTreeMap<String, Vec<SessionTurn>> = BTreeMap::new();
    for turn in turns {
        sessions
            .entry(turn.session_id)
            .or_default()
            .push(SessionTurn {
                message: turn.message,
                response: turn.response,
                timestamp: turn.created_at.to_rfc3339(),
            });
    }
    sessions
}
