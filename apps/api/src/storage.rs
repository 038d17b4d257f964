//! Optional S3 / MinIO mirror for uploaded photos and finished videos.

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::config::S3Config;

#[derive(Clone)]
pub struct ObjectStore {
    s3: aws_sdk_s3::Client,
    http: reqwest::Client,
    bucket: String,
    endpoint: String,
}

impl ObjectStore {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(config: &S3Config) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "macigscool-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        Ok(Self {
            s3: aws_sdk_s3::Client::new(&s3_config),
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()?,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Uploads `body` under `key` and returns its public URL.
    pub async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<String> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(public_url(&self.endpoint, &self.bucket, key))
    }

    /// Downloads `source_url` and re-uploads it under `key`.
    pub async fn mirror(&self, source_url: &str, key: &str, content_type: &str) -> Result<String> {
        let body = self
            .http
            .get(source_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("failed to download {source_url}"))?
            .bytes()
            .await
            .context("failed to read download body")?;

        self.put(key, body, content_type).await
    }
}

pub fn public_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
}

pub fn photo_key(user_id: Uuid, upload_id: Uuid, filename: Option<&str>) -> String {
    let ext = filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("photos/{user_id}/{upload_id}.{ext}")
}

pub fn video_key(user_id: Uuid, video_id: Uuid) -> String {
    format!("videos/{user_id}/{video_id}.mp4")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_trims_slash() {
        assert_eq!(
            public_url("http://minio:9000/", "media", "videos/a.mp4"),
            "http://minio:9000/media/videos/a.mp4"
        );
    }

    #[test]
    fn test_photo_key_keeps_extension() {
        let user = Uuid::nil();
        let upload = Uuid::nil();
        assert_eq!(
            photo_key(user, upload, Some("Soru.JPG")),
            format!("photos/{user}/{upload}.jpg")
        );
    }

    #[test]
    fn test_photo_key_rejects_odd_extensions() {
        let key = photo_key(Uuid::nil(), Uuid::nil(), Some("../../etc/passwd"));
        assert!(key.ends_with(".bin"));
        assert!(photo_key(Uuid::nil(), Uuid::nil(), None).ends_with(".bin"));
    }
}
