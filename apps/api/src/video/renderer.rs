//! Video rendering backends. A renderer turns a scenario into a provider-side
//! job and returns the provider's video id; completion arrives later through
//! the webhook.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::video::scenario::Scenario;

const HEYGEN_GENERATE_URL: &str = "https://api.heygen.com/v2/video/generate";

#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, scenario: &Scenario) -> Result<String, AppError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// MockRenderer
// ────────────────────────────────────────────────────────────────────────────

/// Used when no HeyGen key is configured. Nothing is rendered.
pub struct MockRenderer;

pub fn mock_video_id(unix_seconds: i64) -> String {
    format!("mock-video-id-{unix_seconds}")
}

#[async_trait]
impl VideoRenderer for MockRenderer {
    async fn render(&self, _scenario: &Scenario) -> Result<String, AppError> {
        Ok(mock_video_id(chrono::Utc::now().timestamp()))
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HeyGenRenderer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    video_inputs: Vec<VideoInput<'a>>,
    dimension: Dimension,
}

#[derive(Debug, Serialize)]
struct VideoInput<'a> {
    character: Character<'a>,
    voice: Voice<'a>,
}

#[derive(Debug, Serialize)]
struct Character<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    avatar_id: &'a str,
    avatar_style: &'static str,
}

#[derive(Debug, Serialize)]
struct Voice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    input_text: &'a str,
    voice_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Dimension {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
    data: Option<GenerateData>,
}

#[derive(Debug, Deserialize)]
struct GenerateData {
    video_id: String,
}

pub struct HeyGenRenderer {
    http: reqwest::Client,
    api_key: String,
    avatar_id: String,
    voice_id: String,
}

impl HeyGenRenderer {
    pub fn new(api_key: String, avatar_id: String, voice_id: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            api_key,
            avatar_id,
            voice_id,
        })
    }

    fn request_body<'a>(&'a self, script: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            video_inputs: vec![VideoInput {
                character: Character {
                    kind: "avatar",
                    avatar_id: &self.avatar_id,
                    avatar_style: "normal",
                },
                voice: Voice {
                    kind: "text",
                    input_text: script,
                    voice_id: &self.voice_id,
                },
            }],
            dimension: Dimension {
                width: 1280,
                height: 720,
            },
        }
    }
}

#[async_trait]
impl VideoRenderer for HeyGenRenderer {
    async fn render(&self, scenario: &Scenario) -> Result<String, AppError> {
        let script = scenario.full_script();
        if script.is_empty() {
            return Err(AppError::Validation("Scenario has no narration".to_string()));
        }

        let response = self
            .http
            .post(HEYGEN_GENERATE_URL)
            .header("X-Api-Key", &self.api_key)
            .json(&self.request_body(&script))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("HeyGen request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("HeyGen returned {status}: {body}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("HeyGen response unreadable: {e}")))?;

        match parsed.data {
            Some(data) if !data.video_id.is_empty() => {
                info!("HeyGen accepted render job {}", data.video_id);
                Ok(data.video_id)
            }
            _ => Err(AppError::Upstream(format!(
                "HeyGen returned no video id (error: {})",
                parsed.error.unwrap_or_default()
            ))),
        }
    }

    fn backend(&self) -> &'static str {
        "heygen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::scenario::{ScenarioMetadata, ScenarioSegment};

    fn scenario(text: &str) -> Scenario {
        Scenario {
            metadata: ScenarioMetadata {
                title: "Elif İçin: Türev".to_string(),
                duration_seconds: 180,
                difficulty: "temel".to_string(),
            },
            segments: vec![ScenarioSegment {
                seconds: "0-15".to_string(),
                text: text.to_string(),
                tone: String::new(),
                emphasis: vec![],
            }],
            analysis: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_mock_video_id_format() {
        assert_eq!(mock_video_id(1_700_000_000), "mock-video-id-1700000000");
    }

    #[tokio::test]
    async fn test_mock_renderer_returns_mock_id() {
        let id = MockRenderer.render(&scenario("Merhaba")).await.unwrap();
        assert!(id.starts_with("mock-video-id-"));
    }

    #[test]
    fn test_heygen_request_body_shape() {
        let renderer =
            HeyGenRenderer::new("key".to_string(), "avatar-1".to_string(), "voice-1".to_string())
                .unwrap();
        let body = serde_json::to_value(renderer.request_body("Merhaba Elif!")).unwrap();
        assert_eq!(body["video_inputs"][0]["character"]["type"], "avatar");
        assert_eq!(body["video_inputs"][0]["character"]["avatar_id"], "avatar-1");
        assert_eq!(body["video_inputs"][0]["voice"]["input_text"], "Merhaba Elif!");
        assert_eq!(body["video_inputs"][0]["voice"]["voice_id"], "voice-1");
        assert_eq!(body["dimension"]["width"], 1280);
    }

    #[tokio::test]
    async fn test_heygen_rejects_empty_script() {
        let renderer =
            HeyGenRenderer::new("key".to_string(), "a".to_string(), "v".to_string()).unwrap();
        let err = renderer.render(&scenario("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
