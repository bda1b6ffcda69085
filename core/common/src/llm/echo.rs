//! Echoプロバイダの実装
//!
//! 実際の LLM API は呼ばず、あらかじめ決めた応答を返す。
//! フォールバックやレート制限の経路をネットワーク無しで再現するために使う。

use crate::error::Error;
use crate::llm::provider::{ChatRequest, LlmProvider};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 1 回の呼び出しに対する応答
#[derive(Debug, Clone)]
pub enum EchoReply {
    /// choices[0].message.content としてこの文字列を返す
    Content(String),
    /// HTTP 429 相当
    RateLimited,
    /// 429 以外の HTTP 失敗
    HttpError(String),
    /// レスポンス本文をそのまま返す
    Raw(String),
}

/// Echoプロバイダ
pub struct EchoProvider {
    name: String,
    reply: EchoReply,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
}

impl EchoProvider {
    pub fn new(name: impl Into<String>, reply: EchoReply) -> Self {
        Self {
            name: name.into(),
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// 常に content を返す
    pub fn replying(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(name, EchoReply::Content(content.into()))
    }

    pub fn rate_limited(name: impl Into<String>) -> Self {
        Self::new(name, EchoReply::RateLimited)
    }

    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, EchoReply::HttpError(message.into()))
    }

    pub fn raw(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(name, EchoReply::Raw(body.into()))
    }

    /// 呼び出し回数のカウンタ（プロバイダを Box に移した後も参照できる）
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// 最後に受け取ったリクエスト JSON
    pub fn request_log(&self) -> Arc<Mutex<Option<Value>>> {
        Arc::clone(&self.last_request)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_request_payload(&self, request: &ChatRequest) -> Result<Value, Error> {
        let mut payload = json!({
            "model": self.name,
            "system": request.system_instruction,
            "text": request.text,
            "json_response": request.json_response,
        });
        if let Some(image) = &request.image {
            payload["image_format"] = json!(image.format);
            payload["image_base64"] = json!(image.base64);
        }
        Ok(payload)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = serde_json::from_str(request_json).ok();
        }
        match &self.reply {
            EchoReply::Content(content) => Ok(json!({
                "choices": [{ "message": { "content": content } }]
            })
            .to_string()),
            EchoReply::RateLimited => Err(Error::rate_limited(format!("{}: 429", self.name))),
            EchoReply::HttpError(msg) => Err(Error::http(msg.clone())),
            EchoReply::Raw(body) => Ok(body.clone()),
        }
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        crate::llm::openai_compat::parse_chat_content(response_json)
    }

    fn parse_usage(&self, response_json: &str) -> Option<crate::domain::TokenUsage> {
        crate::llm::openai_compat::parse_chat_usage(response_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::driver::LlmDriver;

    #[test]
    fn test_replying_counts_calls_and_records_request() {
        let provider = EchoProvider::replying("m1", "{\"score\": 3}");
        let counter = provider.call_counter();
        let log = provider.request_log();
        let driver = LlmDriver::new(provider);

        let completion = driver.complete(&ChatRequest::new("sys", "hi")).unwrap();
        assert_eq!(completion.content, "{\"score\": 3}");
        assert_eq!(completion.model.as_str(), "m1");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(log.lock().unwrap().as_ref().unwrap()["text"], "hi");
    }

    #[test]
    fn test_rate_limited_and_failing() {
        let rl = LlmDriver::new(EchoProvider::rate_limited("m1"));
        assert!(rl.complete(&ChatRequest::new("s", "t")).unwrap_err().is_rate_limited());

        let failing = LlmDriver::new(EchoProvider::failing("m2", "boom"));
        assert_eq!(
            failing.complete(&ChatRequest::new("s", "t")).unwrap_err(),
            Error::http("boom")
        );
    }

    #[test]
    fn test_raw_body_with_usage() {
        let provider = EchoProvider::raw(
            "m1",
            r#"{"choices":[{"message":{"content":"x"}}],"usage":{"prompt_tokens":7,"completion_tokens":2,"total_tokens":9}}"#,
        );
        let completion = LlmDriver::new(provider)
            .complete(&ChatRequest::new("s", "t"))
            .unwrap();
        assert_eq!(completion.usage.total_tokens, 9);
    }
}
