//! 投稿判断エンジン
//!
//! 文脈が空ならモデルを呼ばない。呼んだサイクルの Post（失敗の番兵も含む）は必ず PostLog に追記する。

use crate::prompts::user_message;
use common::domain::Post;
use common::error::Error;
use common::jsonl::PostLog;
use common::llm::{ChatRequest, FallbackChain};
use common::ports::outbound::{Clock, Log, LogLevel, LogRecord};
use common::validate::{parse_model_json, sanitize_post};
use std::sync::Arc;

pub struct PostDecisionEngine {
    decision_chain: FallbackChain,
    notes_chain: FallbackChain,
    post_log: PostLog,
    clock: Arc<dyn Clock>,
    log: Arc<dyn Log>,
    decision_instruction: String,
    notes_instruction: String,
}

impl PostDecisionEngine {
    pub fn new(
        decision_chain: FallbackChain,
        notes_chain: FallbackChain,
        post_log: PostLog,
        clock: Arc<dyn Clock>,
        log: Arc<dyn Log>,
        decision_instruction: impl Into<String>,
        notes_instruction: impl Into<String>,
    ) -> Self {
        Self {
            decision_chain,
            notes_chain,
            post_log,
            clock,
            log,
            decision_instruction: decision_instruction.into(),
            notes_instruction: notes_instruction.into(),
        }
    }

    /// 投稿するかを判断する。文脈が空なら None（モデル呼び出しも追記もしない）。
    pub fn decide(&self, context: &str, notes: &str) -> Option<Post> {
        if context.trim().is_empty() {
            self.emit(LogRecord::new(LogLevel::Info, "no recent events, skipping decision"));
            return None;
        }

        let timestamp = self.clock.now();
        let request = ChatRequest::new(
            self.decision_instruction.clone(),
            user_message(context, notes),
        )
        .expect_json();

        let post = self
            .decision_chain
            .first_valid(&request, |completion| {
                let raw = parse_model_json(&completion.content)?;
                Ok(sanitize_post(
                    &raw,
                    timestamp,
                    completion.model.clone(),
                    completion.usage,
                ))
            })
            .unwrap_or_else(|| Post::failure(timestamp));

        if let Err(e) = self.post_log.append(&post) {
            self.emit(
                LogRecord::new(LogLevel::Error, "failed to append post")
                    .with_field("path", self.post_log.path().display().to_string())
                    .with_field("error", e.to_string()),
            );
        }

        self.emit(
            LogRecord::new(LogLevel::Info, "decision made")
                .with_field("score", post.score)
                .with_field("post", post.post)
                .with_field("image_id", post.image_id)
                .with_field(
                    "model",
                    post.model.as_ref().map(|m| m.to_string()).unwrap_or_default(),
                ),
        );
        Some(post)
    }

    /// ノートを更新する。空でない応答を返した最初のモデルの内容を新しいノートにする。
    pub fn update_notes(&self, context: &str, notes: &str) -> Option<String> {
        if context.trim().is_empty() {
            return None;
        }
        let request =
            ChatRequest::new(self.notes_instruction.clone(), user_message(context, notes));
        let updated = self.notes_chain.first_valid(&request, |completion| {
            let text = completion.content.trim();
            if text.is_empty() {
                Err(Error::validation("empty notes"))
            } else {
                Ok(text.to_string())
            }
        });
        if updated.is_some() {
            self.emit(LogRecord::new(LogLevel::Info, "notes updated"));
        }
        updated
    }

    fn emit(&self, record: LogRecord) {
        let _ = self
            .log
            .log(&record.with_layer("usecase").with_kind("decision"));
    }
}
