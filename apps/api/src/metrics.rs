//! Live metrics. Points are generated, not measured; alerts are evaluated
//! against fixed thresholds.

use axum::{extract::State, Json};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

const HISTORY_WINDOW_MINUTES: i64 = 60;
const HISTORY_STEP_MINUTES: i64 = 5;

const CPU_WARNING: f64 = 80.0;
const LATENCY_CRITICAL_MS: f64 = 400.0;
const ERROR_RATE_CRITICAL: f64 = 4.0;

#[derive(Debug, Clone, Serialize)]
pub struct MetricPoint {
    pub timestamp: String,
    pub cpu: f64,
    pub response_time_ms: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub level: &'static str,
    pub message: String,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn generate_point<R: Rng + ?Sized>(rng: &mut R, at: DateTime<Utc>) -> MetricPoint {
    MetricPoint {
        timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
        cpu: round2(rng.gen_range(10.0..=90.0)),
        response_time_ms: round2(rng.gen_range(100.0..=500.0)),
        error_rate: round2(rng.gen_range(0.0..=5.0)),
    }
}

/// One point every 5 minutes over the last hour, newest first.
pub fn generate_history<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<MetricPoint> {
    (0..HISTORY_WINDOW_MINUTES)
        .step_by(HISTORY_STEP_MINUTES as usize)
        .map(|offset| generate_point(rng, now - Duration::minutes(offset)))
        .collect()
}

pub fn evaluate_alerts(point: &MetricPoint) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if point.cpu > CPU_WARNING {
        alerts.push(Alert {
            kind: "cpu",
            level: "warning",
            message: format!("CPU usage at {:.2}% (threshold {CPU_WARNING}%)", point.cpu),
        });
    }
    if point.response_time_ms > LATENCY_CRITICAL_MS {
        alerts.push(Alert {
            kind: "latency",
            level: "critical",
            message: format!(
                "Average response time {:.2} ms above {LATENCY_CRITICAL_MS} ms",
                point.response_time_ms
            ),
        });
    }
    if point.error_rate > ERROR_RATE_CRITICAL {
        alerts.push(Alert {
            kind: "errors",
            level: "critical",
            message: format!(
                "Error rate {:.2}% above {ERROR_RATE_CRITICAL}%",
                point.error_rate
            ),
        });
    }
    alerts
}

/// GET /api/live-metrics/current
pub async fn handle_current(_auth: AuthUser) -> Json<MetricPoint> {
    Json(generate_point(&mut rand::thread_rng(), Utc::now()))
}

/// GET /api/live-metrics/historical
pub async fn handle_historical(_auth: AuthUser) -> Json<Vec<MetricPoint>> {
    Json(generate_history(&mut rand::thread_rng(), Utc::now()))
}

/// GET /api/live-metrics/alerts
pub async fn handle_alerts(_auth: AuthUser) -> Json<Vec<Alert>> {
    let point = generate_point(&mut rand::thread_rng(), Utc::now());
    Json(evaluate_alerts(&point))
}

/// GET /api/live-metrics/summary
pub async fn handle_summary(_auth: AuthUser) -> Json<Value> {
    Json(json!({
        "average_cpu": 55.0,
        "average_response_time_ms": 250.0,
        "error_rate": 1.2,
    }))
}

/// GET /api/metrics/live
pub async fn handle_platform_live(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let rank: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) + 1 FROM users WHERE xp > (SELECT xp FROM users WHERE id = $1)",
    )
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "active_users": 1247,
        "videos_generated_today": 342,
        "avg_score_improvement": 18.5,
        "user_rank": rank,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn point(cpu: f64, latency: f64, errors: f64) -> MetricPoint {
        MetricPoint {
            timestamp: "2025-01-01T00:00:00Z".to_string(),
            cpu,
            response_time_ms: latency,
            error_rate: errors,
        }
    }

    #[test]
    fn test_generated_point_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let p = generate_point(&mut rng, Utc::now());
            assert!((10.0..=90.0).contains(&p.cpu));
            assert!((100.0..=500.0).contains(&p.response_time_ms));
            assert!((0.0..=5.0).contains(&p.error_rate));
            assert!(p.timestamp.ends_with('Z'));
        }
    }

    #[test]
    fn test_history_covers_last_hour() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();
        let history = generate_history(&mut rng, now);
        assert_eq!(history.len(), 12);
        let oldest = (now - Duration::minutes(55)).to_rfc3339_opts(SecondsFormat::Micros, true);
        assert_eq!(history.last().unwrap().timestamp, oldest);
    }

    #[test]
    fn test_no_alerts_when_healthy() {
        assert!(evaluate_alerts(&point(40.0, 200.0, 1.0)).is_empty());
    }

    #[test]
    fn test_alerts_for_each_threshold() {
        let alerts = evaluate_alerts(&point(85.0, 450.0, 4.5));
        let kinds: Vec<_> = alerts.iter().map(|a| (a.kind, a.level)).collect();
        assert_eq!(
            kinds,
            vec![
                ("cpu", "warning"),
                ("latency", "critical"),
                ("errors", "critical")
            ]
        );
    }
}
