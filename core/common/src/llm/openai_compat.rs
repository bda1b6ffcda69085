//! OpenAI Chat Completions 互換 (/chat/completions) プロバイダ
//!
//! base_url で任意のエンドポイント（OpenRouter 等）を指定可能。画像は data URL で送る。

use crate::domain::{ModelName, TokenUsage};
use crate::error::Error;
use crate::llm::provider::{ChatRequest, LlmProvider};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// choices[0].message.content を取り出す。`error` オブジェクトがあれば Http エラー。
pub fn parse_chat_content(response_json: &str) -> Result<Option<String>, Error> {
    let v: Value = serde_json::from_str(response_json)
        .map_err(|e| Error::json(format!("Failed to parse response JSON: {}", e)))?;

    if let Some(err) = v.get("error") {
        let msg = err["message"].as_str().unwrap_or("Unknown error");
        return Err(Error::http(format!("API error: {}", msg)));
    }

    Ok(v["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string()))
}

/// usage.prompt_tokens / completion_tokens / total_tokens を取り出す
pub fn parse_chat_usage(response_json: &str) -> Option<TokenUsage> {
    let v: Value = serde_json::from_str(response_json).ok()?;
    let usage = v.get("usage")?;
    let input = usage["prompt_tokens"].as_u64()?;
    let output = usage["completion_tokens"].as_u64().unwrap_or(0);
    let total = usage["total_tokens"].as_u64().unwrap_or(input + output);
    Some(TokenUsage {
        input_tokens: input,
        output_tokens: output,
        total_tokens: total,
    })
}

fn error_message(status: StatusCode, response_text: &str) -> String {
    serde_json::from_str::<Value>(response_text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| format!("HTTP {}: {}", status, response_text))
}

/// OpenAI Chat Completions 互換プロバイダ（1 インスタンス = 1 モデル）
pub struct OpenAiCompatProvider {
    model: ModelName,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl OpenAiCompatProvider {
    /// 新しいプロバイダを作成
    ///
    /// * `model` - モデル名
    /// * `base_url` - ベース URL（None のとき DEFAULT_BASE_URL）
    /// * `api_key` - Bearer トークン（None のとき Authorization を付けない）
    /// * `timeout` - 1 リクエストのタイムアウト
    pub fn new(
        model: ModelName,
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            model,
            base_url,
            api_key,
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.model.as_str()
    }

    fn make_request_payload(&self, request: &ChatRequest) -> Result<Value, Error> {
        let mut user_content = vec![json!({ "type": "text", "text": request.text })];
        if let Some(image) = &request.image {
            user_content.push(json!({
                "type": "image_url",
                "image_url": { "url": image.data_url() }
            }));
        }

        let mut payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": user_content }
            ]
        });

        if request.json_response {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        Ok(payload)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        let mut builder = self
            .client
            .post(self.url())
            .header("Content-Type", "application/json")
            .body(request_json.to_string());

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::rate_limited(format!(
                "{}: {}",
                self.model,
                error_message(status, &response_text)
            )));
        }
        if !status.is_success() {
            return Err(Error::http(format!(
                "Chat completions error: {}",
                error_message(status, &response_text)
            )));
        }

        Ok(response_text)
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        parse_chat_content(response_json)
    }

    fn parse_usage(&self, response_json: &str) -> Option<TokenUsage> {
        parse_chat_usage(response_json)
    }
}
