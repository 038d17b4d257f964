pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{exams, gamification, metrics, photo, reflex, tutor, users, video, vizyon};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        .route("/api/features", get(health::features_handler))
        // Users / auth
        .route("/api/auth/register", post(users::handlers::handle_register))
        .route("/api/auth/login", post(users::handlers::handle_login))
        .route("/api/users/profile", get(users::handlers::handle_profile))
        .route(
            "/api/users/:user_id/progress",
            get(users::handlers::handle_get_progress).post(users::handlers::handle_post_progress),
        )
        .route(
            "/api/users/:user_id/achievements",
            get(users::handlers::handle_user_achievements),
        )
        // Gamification
        .route("/api/dashboard", get(gamification::handlers::handle_dashboard))
        .route(
            "/api/achievements",
            get(gamification::handlers::handle_list_achievements)
                .post(gamification::handlers::handle_create_achievement),
        )
        .route(
            "/api/weekly-goals",
            get(gamification::handlers::handle_list_goals)
                .post(gamification::handlers::handle_create_goal),
        )
        .route(
            "/api/weekly-goals/:id",
            patch(gamification::handlers::handle_update_goal),
        )
        // AI personality / tutor
        .route(
            "/api/ai-personality/personalities",
            get(tutor::handlers::handle_personalities),
        )
        .route(
            "/api/ai-personality/emotions",
            get(tutor::handlers::handle_emotions),
        )
        .route("/api/ai-personality/stats", get(tutor::handlers::handle_stats))
        .route(
            "/api/ai-personality/chat",
            post(tutor::handlers::handle_personality_chat),
        )
        .route(
            "/api/ai-personality/voice/synthesize",
            post(tutor::handlers::handle_synthesize),
        )
        .route(
            "/api/ai-personality/emotion/analyze",
            post(tutor::handlers::handle_analyze_emotion),
        )
        .route("/api/ai-tutor/chat", post(tutor::handlers::handle_tutor_chat))
        .route(
            "/api/ai-tutor/sessions",
            get(tutor::handlers::handle_tutor_sessions),
        )
        // Photo solver
        .route(
            "/api/photo-solver/analyze",
            post(photo::handlers::handle_analyze),
        )
        .route(
            "/api/photo-solver/detailed-analysis",
            post(photo::handlers::handle_detailed_analysis),
        )
        .route(
            "/api/photo-solver/generate-video",
            post(photo::handlers::handle_generate_video),
        )
        .route(
            "/api/photo-solver/earn-credits",
            post(photo::handlers::handle_earn_credits),
        )
        .route("/api/photo-solver/solve", post(photo::handlers::handle_solve))
        .route(
            "/api/photo-solver/history",
            get(photo::handlers::handle_history),
        )
        // Comprehensive exams
        .route("/api/system-stats", get(exams::handlers::handle_system_stats))
        .route("/api/exam-systems", get(exams::handlers::handle_exam_systems))
        .route("/api/exams/types", get(exams::handlers::handle_exam_types))
        .route("/api/exams/list", get(exams::handlers::handle_list_exams))
        .route(
            "/api/exams/:exam_id/start",
            post(exams::handlers::handle_start_exam),
        )
        .route(
            "/api/stats/platform",
            get(exams::handlers::handle_platform_stats),
        )
        .route(
            "/api/practice-test",
            post(exams::handlers::handle_practice_test),
        )
        .route(
            "/api/performance/:user_id",
            get(exams::handlers::handle_user_performance),
        )
        // Reflex learning
        .route("/api/reflex-learning/chain", get(reflex::handle_chain))
        .route(
            "/api/reflex-learning/reflex/:stage_id",
            get(reflex::handle_stage),
        )
        .route(
            "/api/reflex-learning/quiz/:stage_id",
            post(reflex::handle_quiz),
        )
        .route("/api/reflex/challenges", get(reflex::handle_challenges))
        // Live metrics
        .route("/api/live-metrics/current", get(metrics::handle_current))
        .route(
            "/api/live-metrics/historical",
            get(metrics::handle_historical),
        )
        .route("/api/live-metrics/alerts", get(metrics::handle_alerts))
        .route("/api/live-metrics/summary", get(metrics::handle_summary))
        .route("/api/metrics/live", get(metrics::handle_platform_live))
        // Vizyon AI
        .route("/api/vizyon/stats", get(vizyon::handle_stats))
        .route("/api/vizyon/chat", post(vizyon::handle_chat))
        .route(
            "/api/vizyon/lesson-plan/generate",
            post(vizyon::handle_lesson_plan),
        )
        .route(
            "/api/vizyon/questions/generate",
            post(vizyon::handle_questions),
        )
        // Adaptive video
        .route(
            "/api/video/quiz-completed",
            post(video::handlers::handle_quiz_completed),
        )
        .route("/api/video/generate", post(video::handlers::handle_generate))
        .route("/api/video/list", get(video::handlers::handle_list))
        .route(
            "/api/video/dashboard",
            get(video::handlers::handle_dashboard),
        )
        .route(
            "/api/video/webhook/heygen",
            post(video::handlers::handle_heygen_webhook),
        )
        .route("/api/video/:id", get(video::handlers::handle_get))
        .route(
            "/api/video/:id/analytics",
            post(video::handlers::handle_analytics),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::issue_token;
    use crate::config::Config;
    use crate::photo::ocr::OcrEngine;
    use crate::video::renderer::MockRenderer;
    use crate::video::scenario::TemplateScenarioGenerator;

    // The pool never connects; these routes answer before touching the database.
    fn test_state() -> AppState {
        let config = Config::for_tests();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState {
            db,
            ocr: OcrEngine::new("/nonexistent/tesseract"),
            config,
            llm: None,
            scenarios: Arc::new(TemplateScenarioGenerator),
            renderer: Arc::new(MockRenderer),
            storage: None,
        }
    }

    fn bearer() -> String {
        let token = issue_token("test-secret", Uuid::new_v4(), 7).unwrap();
        format!("Bearer {token}")
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_lists_features() {
        for uri in ["/health", "/api/health"] {
            let (status, body) = send(get_req(uri, None)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert_eq!(body["features"].as_array().unwrap().len(), 10);
            assert!(body["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn test_features_map() {
        let (status, body) = send(get_req("/api/features", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["adaptive_videos"]["new"], true);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let (status, body) = send(get_req("/api/users/profile", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send(get_req("/api/video/list", Some("Bearer not-a-jwt"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_progress_of_other_user_is_forbidden() {
        let uri = format!("/api/users/{}/progress", Uuid::new_v4());
        let (status, body) = send(get_req(&uri, Some(&bearer()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_static_catalogs() {
        let (status, body) = send(get_req("/api/exam-systems", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 8);

        let (status, body) = send(get_req("/api/ai-personality/personalities", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (status, body) = send(get_req("/api/reflex-learning/chain", Some(&bearer()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_reflex_stage_out_of_range() {
        let auth = bearer();
        let (status, _) = send(get_req("/api/reflex-learning/reflex/6", Some(&auth))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = send(get_req("/api/reflex-learning/reflex/3", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["completion_ratio"].as_f64().unwrap() - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let auth = bearer();
        let cases = [
            post_json("/api/auth/register", None, json!({ "name": "Elif", "email": " " })),
            post_json("/api/ai-personality/chat", None, json!({ "message": "  " })),
            post_json("/api/ai-personality/emotion/analyze", None, json!({ "text": "" })),
            post_json("/api/photo-solver/earn-credits", None, json!({ "amount": 5 })),
            post_json(
                "/api/photo-solver/earn-credits",
                None,
                json!({ "user_id": "u-1", "amount": i64::MAX }),
            ),
            post_json("/api/vizyon/chat", Some(&auth), json!({ "message": "" })),
            post_json("/api/practice-test", Some(&auth), json!({ "exam_id": " " })),
            post_json(
                "/api/video/quiz-completed",
                Some(&auth),
                json!({ "score": 120, "correct_answers": 1, "total_questions": 2 }),
            ),
        ];
        for request in cases {
            let uri = request.uri().to_string();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_earn_credits_balance() {
        let (status, body) = send(post_json(
            "/api/photo-solver/earn-credits",
            None,
            json!({ "user_id": "u-1", "amount": 5 }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["new_credit_balance"], 15);
    }

    #[tokio::test]
    async fn test_speech_unavailable_without_key() {
        let (status, body) = send(post_json(
            "/api/ai-personality/voice/synthesize",
            None,
            json!({ "text": "Merhaba" }),
        ))
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_analyze_without_file_is_400() {
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/photo-solver/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_vizyon_question_count_is_clamped() {
        let (status, body) = send(post_json(
            "/api/vizyon/questions/generate",
            Some(&bearer()),
            json!({ "topic": "Türev", "count": 50 }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_exam_list_and_start() {
        let (status, _) = send(get_req("/api/exams/list", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let auth = bearer();
        let (status, body) = send(get_req("/api/exams/list", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        let exams = body.as_array().unwrap();
        assert_eq!(exams.len(), 2);
        assert_eq!(exams[0]["name"], "YKS Matematik");
        assert_eq!(exams[1]["duration"], 120);

        let (status, body) = send(post_json("/api/exams/2/start", Some(&auth), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exam_id"], 2);
        assert!(body["session_id"].is_string());
        assert_eq!(body["questions"], json!([]));

        let (status, _) = send(post_json("/api/exams/9/start", Some(&auth), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_without_action_is_acknowledged() {
        for payload in [
            json!({ "status": "completed" }),
            json!({ "video_id": "hg-1", "status": "processing" }),
            json!({ "video_id": "hg-1", "status": "completed" }),
        ] {
            let (status, body) = send(post_json("/api/video/webhook/heygen", None, payload)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "received");
        }
    }
}
