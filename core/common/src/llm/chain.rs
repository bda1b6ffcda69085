//! モデルのフォールバックチェーン
//!
//! 並べた順にモデルへ問い合わせ、受理関数が Ok を返した最初の結果を採用する。
//! レート制限・HTTP 失敗・受理関数の Err はいずれも「次のモデルへ」。

use crate::domain::ModelName;
use crate::error::Error;
use crate::llm::driver::LlmDriver;
use crate::llm::provider::{ChatRequest, Completion, LlmProvider};
use crate::ports::outbound::{Log, LogLevel, LogRecord};
use std::sync::Arc;

pub struct FallbackChain {
    /// ログ用のラベル（analysis / decision / notes）
    label: String,
    drivers: Vec<LlmDriver<Box<dyn LlmProvider>>>,
    log: Arc<dyn Log>,
}

impl FallbackChain {
    pub fn new(
        label: impl Into<String>,
        providers: Vec<Box<dyn LlmProvider>>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            label: label.into(),
            drivers: providers.into_iter().map(LlmDriver::new).collect(),
            log,
        }
    }

    /// 問い合わせ順のモデル名（起動ログ用）
    pub fn model_names(&self) -> Vec<ModelName> {
        self.drivers
            .iter()
            .map(|d| ModelName::new(d.provider().name()))
            .collect()
    }

    /// 受理された最初の結果を返す。全モデルが失敗したら None。
    pub fn first_valid<T>(
        &self,
        request: &ChatRequest,
        mut accept: impl FnMut(&Completion) -> Result<T, Error>,
    ) -> Option<T> {
        for driver in &self.drivers {
            let model = driver.provider().name();
            let outcome = driver.complete(request).and_then(|c| accept(&c));
            match outcome {
                Ok(value) => {
                    self.emit(LogLevel::Debug, "model accepted", model, None);
                    return Some(value);
                }
                Err(e) if e.is_rate_limited() => {
                    self.emit(LogLevel::Warn, "model rate limited", model, Some(&e));
                }
                Err(e) => {
                    self.emit(LogLevel::Error, "model failed", model, Some(&e));
                }
            }
        }

        let _ = self.log.log(
            &LogRecord::new(LogLevel::Error, format!("all {} models failed", self.label))
                .with_layer("usecase")
                .with_kind(&self.label)
                .with_field("models", self.drivers.len()),
        );
        None
    }

    fn emit(&self, level: LogLevel, message: &str, model: &str, err: Option<&Error>) {
        let mut record = LogRecord::new(level, message)
            .with_layer("usecase")
            .with_kind(&self.label)
            .with_field("model", model);
        if let Some(e) = err {
            record = record.with_field("error", e.to_string());
        }
        let _ = self.log.log(&record);
    }
}
