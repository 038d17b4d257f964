//! Text extraction for uploaded problems.
//!
//! PDFs go through `pdf-extract`; images are handed to the `tesseract`
//! executable with the Turkish language pack. Extraction never fails the
//! request: any error is logged and yields an empty string.

use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tracing::{debug, warn};

const OCR_LANGUAGE: &str = "tur";

#[derive(Debug, Clone)]
pub struct OcrEngine {
    tesseract_cmd: String,
}

impl OcrEngine {
    pub fn new(tesseract_cmd: impl Into<String>) -> Self {
        Self {
            tesseract_cmd: tesseract_cmd.into(),
        }
    }

    pub async fn extract_text(&self, data: Bytes, content_type: Option<&str>) -> String {
        if data.is_empty() {
            return String::new();
        }
        let is_pdf = looks_like_pdf(&data, content_type);
        let cmd = self.tesseract_cmd.clone();

        let result = tokio::task::spawn_blocking(move || {
            if is_pdf {
                pdf_extract::extract_text_from_mem(&data)
                    .map_err(|e| anyhow::anyhow!("PDF text extraction failed: {e}"))
            } else {
                run_tesseract(&cmd, &data)
            }
        })
        .await;

        match result {
            Ok(Ok(text)) => {
                let text = text.trim().to_string();
                debug!("OCR extracted {} chars (pdf={is_pdf})", text.len());
                text
            }
            Ok(Err(e)) => {
                warn!("OCR failed: {e:#}");
                String::new()
            }
            Err(e) => {
                warn!("OCR task panicked: {e}");
                String::new()
            }
        }
    }
}

fn looks_like_pdf(data: &[u8], content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"))
        || data.starts_with(b"%PDF")
}

fn run_tesseract(cmd: &str, data: &[u8]) -> Result<String> {
    let mut input = tempfile::Builder::new()
        .prefix("ocr-")
        .tempfile()
        .context("failed to create temp file")?;
    input.write_all(data).context("failed to write temp file")?;
    input.flush()?;

    let output = Command::new(cmd)
        .arg(input.path())
        .arg("stdout")
        .arg("-l")
        .arg(OCR_LANGUAGE)
        .output()
        .with_context(|| format!("failed to run '{cmd}'"))?;

    if !output.status.success() {
        bail!(
            "tesseract exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(looks_like_pdf(b"%PDF-1.7 ...", None));
        assert!(looks_like_pdf(b"whatever", Some("application/PDF")));
        assert!(!looks_like_pdf(b"\x89PNG", Some("image/png")));
    }

    #[tokio::test]
    async fn test_missing_binary_yields_empty_text() {
        let engine = OcrEngine::new("/nonexistent/tesseract-binary");
        let text = engine
            .extract_text(Bytes::from_static(b"\x89PNG fake"), Some("image/png"))
            .await;
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_empty_upload_yields_empty_text() {
        let engine = OcrEngine::new("tesseract");
        assert_eq!(engine.extract_text(Bytes::new(), None).await, "");
    }
}
