use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

const FEATURES: [&str; 10] = [
    "AI Tutor (Sokratik Yöntem)",
    "Photo Solver (OCR)",
    "Adaptive Video System",
    "Comprehensive Exams",
    "Gamification Engine",
    "Emotion Detection",
    "Voice Synthesis",
    "Progress Tracking",
    "Achievement System",
    "Weekly Goals",
];

/// GET /health, GET /api/health
/// Returns a status object with the service version and enabled features.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "macigscool-api",
        "features": FEATURES,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/features
pub async fn features_handler() -> Json<Value> {
    Json(json!({
        "ai_personality": {
            "name": "AI Personality",
            "description": "Empatik AI öğretmen",
            "status": "active"
        },
        "photo_solver": {
            "name": "Fotoğraf Çözücü",
            "description": "Fotoğraftan soru çözme",
            "status": "active"
        },
        "comprehensive_exams": {
            "name": "Kapsamlı Sınavlar",
            "description": "Gerçek sınav deneyimi",
            "status": "active"
        },
        "reflex_learning": {
            "name": "Refleks Öğrenme",
            "description": "Hızlı öğrenme teknikleri",
            "status": "active"
        },
        "adaptive_videos": {
            "name": "Adaptif Video Sistemi",
            "description": "Kişiselleştirilmiş eğitim videoları",
            "status": "active",
            "new": true
        }
    }))
}
