//! Scenario generation: the narrated script a rendered lesson video follows.
//!
//! `AppState` carries an `Arc<dyn ScenarioGenerator>`. Without an OpenAI key
//! the `TemplateScenarioGenerator` produces a short canned greeting; with a
//! key the `LlmScenarioGenerator` asks the model for a full script.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::video::prompts::{SCENARIO_PROMPT_TEMPLATE, SCENARIO_SYSTEM};

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// Who the video is for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentData {
    #[serde(rename = "ad")]
    pub name: String,
    #[serde(rename = "sinav_turu")]
    pub exam_type: String,
}

/// The recent results the script adapts to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceData {
    #[serde(rename = "konu_adi")]
    pub topic: String,
    #[serde(rename = "ortalama_skor")]
    pub average_score: f64,
    #[serde(rename = "son_5_skor")]
    pub last_scores: Vec<i32>,
    #[serde(rename = "zayif_konular")]
    pub weak_topics: Vec<String>,
}

/// Target length and difficulty for a given average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBand {
    pub target_seconds: i32,
    pub difficulty: &'static str,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score < 50.0 {
            Self {
                target_seconds: 180,
                difficulty: "temel",
            }
        } else if score < 75.0 {
            Self {
                target_seconds: 300,
                difficulty: "orta",
            }
        } else {
            Self {
                target_seconds: 240,
                difficulty: "ileri",
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioMetadata {
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "sure_saniye")]
    pub duration_seconds: i32,
    #[serde(rename = "zorluk_seviyesi")]
    pub difficulty: String,
}

/// One timed slice of narration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSegment {
    /// Time range such as `"0-15"`.
    #[serde(rename = "saniye")]
    pub seconds: String,
    #[serde(rename = "metin")]
    pub text: String,
    #[serde(rename = "ton", default)]
    pub tone: String,
    #[serde(rename = "vurgu", default)]
    pub emphasis: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(rename = "video_metadata")]
    pub metadata: ScenarioMetadata,
    #[serde(rename = "senaryo")]
    pub segments: Vec<ScenarioSegment>,
    #[serde(rename = "hipnotik_analizler", default)]
    pub analysis: Value,
}

impl Scenario {
    /// The narration joined into a single script.
    pub fn full_script(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ScenarioGenerator: Send + Sync {
    async fn generate(
        &self,
        student: &StudentData,
        performance: &PerformanceData,
    ) -> Result<Scenario, AppError>;

    /// Backend name, for logs.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// TemplateScenarioGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct TemplateScenarioGenerator;

pub fn template_scenario(student: &StudentData, performance: &PerformanceData) -> Scenario {
    Scenario {
        metadata: ScenarioMetadata {
            title: format!("{} İçin: {}", student.name, performance.topic),
            duration_seconds: 180,
            difficulty: "temel".to_string(),
        },
        segments: vec![ScenarioSegment {
            seconds: "0-15".to_string(),
            text: format!("Merhaba {}! Bu video senin için hazırlandı.", student.name),
            tone: "enerjik".to_string(),
            emphasis: vec![student.name.clone(), "senin için".to_string()],
        }],
        analysis: json!({ "isim_tekrar_sayisi": 7, "kavram_tekrar": 3 }),
    }
}

#[async_trait]
impl ScenarioGenerator for TemplateScenarioGenerator {
    async fn generate(
        &self,
        student: &StudentData,
        performance: &PerformanceData,
    ) -> Result<Scenario, AppError> {
        Ok(template_scenario(student, performance))
    }

    fn backend(&self) -> &'static str {
        "template"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmScenarioGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmScenarioGenerator {
    llm: LlmClient,
}

impl LlmScenarioGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

pub fn scenario_prompt(student: &StudentData, performance: &PerformanceData) -> String {
    let band = ScoreBand::for_score(performance.average_score);
    let input = json!({ "ogrenci": student, "performans": performance });
    let input_json = serde_json::to_string_pretty(&input).unwrap_or_else(|_| input.to_string());
    SCENARIO_PROMPT_TEMPLATE
        .replace("{target_seconds}", &band.target_seconds.to_string())
        .replace("{difficulty}", band.difficulty)
        .replace("{input_json}", &input_json)
}

#[async_trait]
impl ScenarioGenerator for LlmScenarioGenerator {
    async fn generate(
        &self,
        student: &StudentData,
        performance: &PerformanceData,
    ) -> Result<Scenario, AppError> {
        let prompt = scenario_prompt(student, performance);
        let system = format!("{SCENARIO_SYSTEM}\n\n{JSON_ONLY_SYSTEM}");
        debug!("Requesting scenario for topic '{}'", performance.topic);

        let scenario: Scenario = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Upstream(format!("scenario generation failed: {e}")))?;

        if scenario.full_script().is_empty() {
            return Err(AppError::Upstream(
                "scenario generation returned no narration".to_string(),
            ));
        }

        info!(
            "Generated scenario '{}' with {} segments",
            scenario.metadata.title,
            scenario.segments.len()
        );
        Ok(scenario)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentData {
        StudentData {
            name: "Elif".to_string(),
            exam_type: "YKS".to_string(),
        }
    }

    fn performance(avg: f64) -> PerformanceData {
        PerformanceData {
            topic: "Geometri - Alan".to_string(),
            average_score: avg,
            last_scores: vec![45, 48, 52, 54, 50],
            weak_topics: vec!["dikdortgen_alan".to_string()],
        }
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::for_score(49.9).target_seconds, 180);
        assert_eq!(ScoreBand::for_score(49.9).difficulty, "temel");
        assert_eq!(ScoreBand::for_score(50.0).target_seconds, 300);
        assert_eq!(ScoreBand::for_score(74.0).difficulty, "orta");
        assert_eq!(ScoreBand::for_score(75.0).target_seconds, 240);
        assert_eq!(ScoreBand::for_score(100.0).difficulty, "ileri");
    }

    #[tokio::test]
    async fn test_template_scenario() {
        let scenario = TemplateScenarioGenerator
            .generate(&student(), &performance(52.0))
            .await
            .unwrap();
        assert_eq!(scenario.metadata.title, "Elif İçin: Geometri - Alan");
        assert_eq!(scenario.metadata.duration_seconds, 180);
        assert_eq!(scenario.metadata.difficulty, "temel");
        assert_eq!(scenario.segments.len(), 1);
        assert_eq!(scenario.segments[0].seconds, "0-15");
        assert_eq!(
            scenario.full_script(),
            "Merhaba Elif! Bu video senin için hazırlandı."
        );
    }

    #[test]
    fn test_scenario_parses_model_output() {
        let raw = r#"{
            "video_metadata": {"baslik": "Elif İçin: Türev", "sure_saniye": 240, "zorluk_seviyesi": "ileri"},
            "senaryo": [
                {"saniye": "0-15", "metin": "Merhaba Elif!", "ton": "enerjik", "vurgu": ["Elif"]},
                {"saniye": "15-40", "metin": "Türev bir değişim hızıdır."}
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(raw).unwrap();
        assert_eq!(scenario.metadata.duration_seconds, 240);
        assert!(scenario.segments[1].emphasis.is_empty());
        assert!(scenario.analysis.is_null());
        assert_eq!(
            scenario.full_script(),
            "Merhaba Elif! Türev bir değişim hızıdır."
        );
    }

    #[test]
    fn test_prompt_carries_band_and_input() {
        let prompt = scenario_prompt(&student(), &performance(80.0));
        assert!(prompt.contains("Hedef süre: 240 saniye"));
        assert!(prompt.contains("Zorluk seviyesi: ileri"));
        assert!(prompt.contains("\"konu_adi\": \"Geometri - Alan\""));
        assert!(prompt.contains("\"ad\": \"Elif\""));
    }
}
