//! 1 枚のスクリーンショットを Event に変換する
//!
//! 失敗は値で返す。画像が読めない・全モデルが失敗した場合は score=0 の番兵 Event。

use crate::prompts::ANALYSIS_USER_TEXT;
use common::domain::Event;
use common::llm::provider::image_format_for;
use common::llm::{ChatRequest, FallbackChain, ImagePayload};
use common::ports::outbound::{Clock, FileSystem, Log, LogLevel, LogRecord};
use common::validate::{parse_model_json, sanitize_event};
use std::path::Path;
use std::sync::Arc;

pub struct Analyzer {
    chain: FallbackChain,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn Log>,
    system_instruction: String,
}

impl Analyzer {
    pub fn new(
        chain: FallbackChain,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        log: Arc<dyn Log>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            fs,
            clock,
            log,
            system_instruction: system_instruction.into(),
        }
    }

    /// 画像を解析する。モデルを先頭から順に試し、JSON オブジェクトを返した最初の応答を採用。
    pub fn analyze(&self, image_path: &Path) -> Event {
        let timestamp = self.clock.now();

        let bytes = match self.fs.read(image_path) {
            Ok(b) => b,
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Error, "failed to read screenshot")
                        .with_layer("usecase")
                        .with_kind("analysis")
                        .with_field("path", image_path.display().to_string())
                        .with_field("error", e.to_string()),
                );
                return Event::failure(image_path, timestamp);
            }
        };

        let request = ChatRequest::new(self.system_instruction.clone(), ANALYSIS_USER_TEXT)
            .with_image(ImagePayload::from_bytes(&bytes, image_format_for(image_path)))
            .expect_json();

        let event = self
            .chain
            .first_valid(&request, |completion| {
                let raw = parse_model_json(&completion.content)?;
                Ok(sanitize_event(
                    &raw,
                    image_path,
                    timestamp,
                    completion.model.clone(),
                    completion.usage,
                ))
            })
            .unwrap_or_else(|| Event::failure(image_path, timestamp));

        let _ = self.log.log(
            &LogRecord::new(LogLevel::Info, "screenshot analyzed")
                .with_layer("usecase")
                .with_kind("analysis")
                .with_field("path", image_path.display().to_string())
                .with_field("score", event.score)
                .with_field(
                    "model",
                    event.model.as_ref().map(|m| m.to_string()).unwrap_or_default(),
                )
                .with_field("total_tokens", event.token_usage.total_tokens),
        );
        event
    }
}
