//! Webhook へ JSON を POST する Publisher
//!
//! 本文: `{"text": ..., "image_name": ..., "image_base64": ...}`（画像は読めたときだけ）。2xx なら成功。

use crate::ports::outbound::Publisher;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use common::error::Error;
use common::ports::outbound::{FileSystem, Log, LogLevel, LogRecord};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct WebhookPublisher {
    client: reqwest::blocking::Client,
    url: String,
    fs: Arc<dyn FileSystem>,
    log: Arc<dyn Log>,
}

impl WebhookPublisher {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        fs: Arc<dyn FileSystem>,
        log: Arc<dyn Log>,
    ) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            fs,
            log,
        })
    }

    /// 投稿本文を組み立てる。画像が読めなければテキストのみ。
    pub(crate) fn body(&self, text: &str, image: Option<&Path>) -> Value {
        let mut body = json!({ "text": text });
        let Some(path) = image else {
            return body;
        };
        match self.fs.read(path) {
            Ok(bytes) => {
                body["image_name"] = json!(path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default());
                body["image_base64"] = json!(BASE64.encode(bytes));
            }
            Err(e) => {
                self.emit(
                    LogRecord::new(LogLevel::Warn, "image unavailable, publishing text only")
                        .with_field("path", path.display().to_string())
                        .with_field("error", e.to_string()),
                );
            }
        }
        body
    }

    fn send(&self, body: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .with_context(|| format!("POST {}", self.url))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(anyhow!("webhook returned {}: {}", status, text));
        }
        Ok(())
    }

    fn emit(&self, record: LogRecord) {
        let _ = self
            .log
            .log(&record.with_layer("adapter").with_kind("publish"));
    }
}

impl Publisher for WebhookPublisher {
    fn publish(&self, text: &str, image: Option<&Path>) -> bool {
        let body = self.body(text, image);
        match self.send(&body) {
            Ok(()) => {
                self.emit(
                    LogRecord::new(LogLevel::Info, "published")
                        .with_field("with_image", body.get("image_base64").is_some()),
                );
                true
            }
            Err(e) => {
                self.emit(
                    LogRecord::new(LogLevel::Error, "publish failed")
                        .with_field("error", format!("{:#}", e)),
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::{MemoryLog, StdFileSystem};

    fn publisher(log: Arc<MemoryLog>) -> WebhookPublisher {
        WebhookPublisher::new(
            "http://127.0.0.1:9/hook",
            Duration::from_secs(1),
            Arc::new(StdFileSystem),
            log,
        )
        .unwrap()
    }

    #[test]
    fn test_body_with_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shot.png");
        std::fs::write(&image, b"abc").unwrap();

        let body = publisher(Arc::new(MemoryLog::new())).body("Boulder Badge!", Some(&image));
        assert_eq!(body["text"], "Boulder Badge!");
        assert_eq!(body["image_name"], "shot.png");
        assert_eq!(body["image_base64"], "YWJj");
    }

    #[test]
    fn test_body_missing_image_is_text_only() {
        let log = Arc::new(MemoryLog::new());
        let body = publisher(log.clone()).body("hi", Some(Path::new("/nonexistent/x.png")));
        assert_eq!(body, json!({ "text": "hi" }));
        assert_eq!(log.messages_at(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn test_publish_unreachable_returns_false() {
        let log = Arc::new(MemoryLog::new());
        assert!(!publisher(log.clone()).publish("hi", None));
        assert_eq!(log.messages_at(LogLevel::Error), vec!["publish failed"]);
    }
}
