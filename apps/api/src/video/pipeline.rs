//! Background generation: scenario → render job → provider id on the row.
//!
//! Runs in a detached task once the triggering request has committed. The
//! webhook handler finishes the loop when the provider reports back.

use std::collections::BTreeMap;

use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::video::STATUS_FAILED;
use crate::state::AppState;
use crate::video::renderer::VideoRenderer;
use crate::video::scenario::{PerformanceData, Scenario, ScenarioGenerator, StudentData};

const DEFAULT_STUDENT_NAME: &str = "Öğrenci";
const DEFAULT_EXAM_TYPE: &str = "YKS";
const RECENT_SCORES: usize = 5;
const HISTORY_WINDOW: i64 = 20;
const WEAK_TOPIC_THRESHOLD: f64 = 50.0;

/// A `processing` video waiting for its scenario and render job.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
}

/// What a successful generation stores on the video row.
#[derive(Debug, Clone)]
pub struct RenderedVideo {
    pub provider_id: String,
    pub scenario: Scenario,
}

/// One past attempt: `(topic, score)`, newest first.
pub type ScoreRow = (Option<String>, i32);

pub async fn load_student(db: &PgPool, user_id: Uuid) -> Result<StudentData, AppError> {
    let row: Option<(String, Option<String>)> =
        sqlx::query_as("SELECT name, exam_type FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;

    let (name, exam_type) = row.unwrap_or_default();
    Ok(StudentData {
        name: if name.trim().is_empty() {
            DEFAULT_STUDENT_NAME.to_string()
        } else {
            name
        },
        exam_type: exam_type
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXAM_TYPE.to_string()),
    })
}

pub async fn load_performance(
    db: &PgPool,
    user_id: Uuid,
    topic: &str,
) -> Result<PerformanceData, AppError> {
    let rows: Vec<ScoreRow> = sqlx::query_as(
        "SELECT topic, score FROM performances WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(HISTORY_WINDOW)
    .fetch_all(db)
    .await?;

    Ok(summarize_performance(topic, &rows))
}

/// Builds the performance summary for `topic` from recent attempts.
///
/// Scores come from attempts on the same topic, or from all attempts when
/// the topic has none. Weak topics are those averaging under 50.
pub fn summarize_performance(topic: &str, rows: &[ScoreRow]) -> PerformanceData {
    let on_topic: Vec<i32> = rows
        .iter()
        .filter(|(t, _)| t.as_deref() == Some(topic))
        .map(|(_, score)| *score)
        .collect();
    let source: Vec<i32> = if on_topic.is_empty() {
        rows.iter().map(|(_, score)| *score).collect()
    } else {
        on_topic
    };

    let mut last_scores: Vec<i32> = source.into_iter().take(RECENT_SCORES).collect();
    // Oldest first, the way a progress chart reads.
    last_scores.reverse();

    let average_score = if last_scores.is_empty() {
        0.0
    } else {
        let sum: i32 = last_scores.iter().sum();
        (sum as f64 / last_scores.len() as f64 * 10.0).round() / 10.0
    };

    let mut by_topic: BTreeMap<&str, (i32, i32)> = BTreeMap::new();
    for (t, score) in rows {
        if let Some(t) = t.as_deref() {
            let entry = by_topic.entry(t).or_insert((0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    let weak_topics = by_topic
        .into_iter()
        .filter(|(_, (sum, n))| (*sum as f64 / *n as f64) < WEAK_TOPIC_THRESHOLD)
        .map(|(t, _)| t.to_string())
        .collect();

    PerformanceData {
        topic: topic.to_string(),
        average_score,
        last_scores,
        weak_topics,
    }
}

/// Spawns the generation task for `job`. Failures mark the video `failed`.
pub fn spawn_generation(state: AppState, job: GenerationJob) {
    tokio::spawn(async move {
        match run_generation(&state, &job).await {
            Ok(provider_id) => info!(
                "Video {} submitted for rendering (provider id {provider_id})",
                job.video_id
            ),
            Err(e) => {
                error!("Video generation failed for {}: {e}", job.video_id);
                if let Err(e) = mark_failed(&state.db, job.video_id).await {
                    error!("Could not mark video {} as failed: {e}", job.video_id);
                }
            }
        }
    });
}

/// Writes the scenario and submits the render job. Errors are returned to
/// the caller, which marks the video failed.
pub async fn produce(
    scenarios: &dyn ScenarioGenerator,
    renderer: &dyn VideoRenderer,
    student: &StudentData,
    performance: &PerformanceData,
) -> Result<RenderedVideo, AppError> {
    let scenario = scenarios.generate(student, performance).await?;
    let provider_id = renderer.render(&scenario).await?;
    Ok(RenderedVideo {
        provider_id,
        scenario,
    })
}

async fn run_generation(state: &AppState, job: &GenerationJob) -> Result<String, AppError> {
    info!(
        "Generating video {} (scenario={}, renderer={})",
        job.video_id,
        state.scenarios.backend(),
        state.renderer.backend()
    );

    let student = load_student(&state.db, job.user_id).await?;
    let performance = load_performance(&state.db, job.user_id, &job.topic).await?;

    let rendered = produce(
        state.scenarios.as_ref(),
        state.renderer.as_ref(),
        &student,
        &performance,
    )
    .await?;

    let metadata = json!({
        "scenario": rendered.scenario,
        "scenario_backend": state.scenarios.backend(),
        "renderer": state.renderer.backend(),
        "student": student,
        "performance": performance,
    });

    sqlx::query(
        r#"
        UPDATE videos
        SET provider_video_id = $2,
            scenario_metadata = $3,
            duration_seconds = $4,
            difficulty = $5,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(job.video_id)
    .bind(&rendered.provider_id)
    .bind(metadata)
    .bind(rendered.scenario.metadata.duration_seconds)
    .bind(&rendered.scenario.metadata.difficulty)
    .execute(&state.db)
    .await?;

    Ok(rendered.provider_id)
}

async fn mark_failed(db: &PgPool, video_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE videos SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(video_id)
        .bind(STATUS_FAILED)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::video::renderer::MockRenderer;
    use crate::video::scenario::TemplateScenarioGenerator;

    struct FailingRenderer;

    #[async_trait]
    impl VideoRenderer for FailingRenderer {
        async fn render(&self, _scenario: &Scenario) -> Result<String, AppError> {
            Err(AppError::Upstream("render rejected".to_string()))
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    fn inputs() -> (StudentData, PerformanceData) {
        (
            StudentData {
                name: "Elif".to_string(),
                exam_type: "YKS".to_string(),
            },
            summarize_performance("Türev", &[row("Türev", 40)]),
        )
    }

    #[tokio::test]
    async fn test_produce_returns_provider_id_and_scenario() {
        let (student, performance) = inputs();
        let rendered = produce(&TemplateScenarioGenerator, &MockRenderer, &student, &performance)
            .await
            .unwrap();
        assert!(rendered.provider_id.starts_with("mock-video-id-"));
        assert_eq!(rendered.scenario.metadata.title, "Elif İçin: Türev");
    }

    #[tokio::test]
    async fn test_produce_surfaces_render_failure() {
        let (student, performance) = inputs();
        let err = produce(&TemplateScenarioGenerator, &FailingRenderer, &student, &performance)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    fn row(topic: &str, score: i32) -> ScoreRow {
        (Some(topic.to_string()), score)
    }

    #[test]
    fn test_summary_prefers_topic_scores() {
        let rows = vec![
            row("Türev", 80),
            row("Geometri", 40),
            row("Türev", 60),
            row("Geometri", 50),
        ];
        let summary = summarize_performance("Türev", &rows);
        assert_eq!(summary.last_scores, vec![60, 80]);
        assert_eq!(summary.average_score, 70.0);
        assert_eq!(summary.weak_topics, vec!["Geometri".to_string()]);
    }

    #[test]
    fn test_summary_falls_back_to_all_scores() {
        let rows = vec![row("Geometri", 45), (None, 55), row("Kimya", 90)];
        let summary = summarize_performance("Türev", &rows);
        assert_eq!(summary.last_scores, vec![90, 55, 45]);
        assert_eq!(summary.average_score, 63.3);
    }

    #[test]
    fn test_summary_keeps_last_five() {
        let rows: Vec<ScoreRow> = (1..=8).rev().map(|i| row("Türev", i * 10)).collect();
        let summary = summarize_performance("Türev", &rows);
        assert_eq!(summary.last_scores, vec![40, 50, 60, 70, 80]);
        assert_eq!(summary.average_score, 60.0);
    }

    #[test]
    fn test_summary_without_history() {
        let summary = summarize_performance("Türev", &[]);
        assert!(summary.last_scores.is_empty());
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.weak_topics.is_empty());
    }
}
