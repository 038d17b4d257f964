use anyhow::{Context, Result};

const MAX_JWT_EXPIRY_DAYS: i64 = 365;
const DEFAULT_HEYGEN_AVATAR_ID: &str = "Daisy-inskirt-20220818";
const DEFAULT_HEYGEN_VOICE_ID: &str = "2d5b0e6cf36f460aa7fc47e3eee4ba54";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub cors_allowed_origins: Vec<String>,
    pub openai_api_key: Option<String>,
    pub openai_tts_model: String,
    pub openai_tts_voice: String,
    pub heygen_api_key: Option<String>,
    pub heygen_avatar_id: String,
    pub heygen_voice_id: String,
    pub tesseract_cmd: String,
    /// Present only when all four S3 variables are set.
    pub s3: Option<S3Config>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET_KEY")?,
            jwt_expiry_days: parse_expiry_days(
                &std::env::var("JWT_EXPIRY_DAYS").unwrap_or_else(|_| "7".to_string()),
            )?,
            cors_allowed_origins: parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_tts_model: std::env::var("OPENAI_TTS_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini-tts".to_string()),
            openai_tts_voice: std::env::var("OPENAI_TTS_VOICE")
                .unwrap_or_else(|_| "alloy".to_string()),
            heygen_api_key: optional_env("HEYGEN_API_KEY"),
            heygen_avatar_id: std::env::var("HEYGEN_AVATAR_ID")
                .unwrap_or_else(|_| DEFAULT_HEYGEN_AVATAR_ID.to_string()),
            heygen_voice_id: std::env::var("HEYGEN_VOICE_ID")
                .unwrap_or_else(|_| DEFAULT_HEYGEN_VOICE_ID.to_string()),
            tesseract_cmd: std::env::var("TESSERACT_CMD")
                .unwrap_or_else(|_| "tesseract".to_string()),
            s3: s3_from_env(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// True when CORS should accept any origin.
    pub fn cors_is_permissive(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}

fn parse_expiry_days(raw: &str) -> Result<i64> {
    let days = raw
        .trim()
        .parse::<i64>()
        .context("JWT_EXPIRY_DAYS must be an integer")?;
    if !(1..=MAX_JWT_EXPIRY_DAYS).contains(&days) {
        anyhow::bail!("JWT_EXPIRY_DAYS must be between 1 and {MAX_JWT_EXPIRY_DAYS}, got {days}");
    }
    Ok(days)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats unset and blank values the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn s3_from_env() -> Option<S3Config> {
    Some(S3Config {
        bucket: optional_env("S3_BUCKET")?,
        endpoint: optional_env("S3_ENDPOINT")?,
        access_key_id: optional_env("AWS_ACCESS_KEY_ID")?,
        secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY")?,
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
impl Config {
    /// Minimal config for router tests. No external services are enabled.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/macigscool_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_days: 7,
            cors_allowed_origins: vec!["*".to_string()],
            openai_api_key: None,
            openai_tts_model: "gpt-4o-mini-tts".to_string(),
            openai_tts_voice: "alloy".to_string(),
            heygen_api_key: None,
            heygen_avatar_id: DEFAULT_HEYGEN_AVATAR_ID.to_string(),
            heygen_voice_id: DEFAULT_HEYGEN_VOICE_ID.to_string(),
            tesseract_cmd: "tesseract".to_string(),
            s3: None,
            port: 5000,
            rust_log: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        assert_eq!(
            parse_origins("https://a.com, https://b.com ,"),
            vec!["https://a.com".to_string(), "https://b.com".to_string()]
        );
    }

    #[test]
    fn test_parse_origins_empty_falls_back_to_wildcard() {
        assert_eq!(parse_origins("  "), vec!["*".to_string()]);
    }

    #[test]
    fn test_permissive_detection() {
        let mut config = Config::for_tests();
        assert!(config.cors_is_permissive());
        config.cors_allowed_origins = vec!["https://app.example.com".to_string()];
        assert!(!config.cors_is_permissive());
    }

    #[test]
    fn test_expiry_days_accepts_range() {
        assert_eq!(parse_expiry_days("7").unwrap(), 7);
        assert_eq!(parse_expiry_days(" 1 ").unwrap(), 1);
        assert_eq!(parse_expiry_days("365").unwrap(), 365);
    }

    #[test]
    fn test_expiry_days_rejects_out_of_range() {
        for raw in ["0", "-3", "366", "9223372036854775807", "seven"] {
            assert!(parse_expiry_days(raw).is_err(), "{raw} should be rejected");
        }
    }
}
