//! LLMドライバーの実装
//!
//! プロバイダに依存しない共通処理（ペイロード生成 → HTTP → テキスト抽出 → 使用量）を提供します。

use crate::domain::{ModelName, TokenUsage};
use crate::error::Error;
use crate::llm::provider::{ChatRequest, Completion, LlmProvider};

/// 1 トークンあたりの文字数の目安（バックエンドが usage を返さないときの概算用）
const CHARS_PER_TOKEN: usize = 4;

/// テキストのトークン数を概算する
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count();
    chars.div_ceil(CHARS_PER_TOKEN) as u64
}

fn estimate_usage(request: &ChatRequest, content: &str) -> TokenUsage {
    let input = estimate_tokens(&request.system_instruction) + estimate_tokens(&request.text);
    TokenUsage::new(input, estimate_tokens(content))
}

/// LLMドライバー
pub struct LlmDriver<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmDriver<P> {
    /// 新しいドライバーを作成
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// 1 回問い合わせて応答を得る
    ///
    /// # Returns
    /// * `Ok(Completion)` - 応答テキストと使用量
    /// * `Err(Error)` - RateLimited / Http / Json / Validation
    pub fn complete(&self, request: &ChatRequest) -> Result<Completion, Error> {
        let payload = self.provider.make_request_payload(request)?;
        let request_json = serde_json::to_string(&payload)
            .map_err(|e| Error::json(format!("Failed to serialize request: {}", e)))?;

        let response_json = self.provider.make_http_request(&request_json)?;

        let content = self
            .provider
            .parse_response_text(&response_json)?
            .ok_or_else(|| Error::validation("No text in response"))?;

        let usage = self
            .provider
            .parse_usage(&response_json)
            .unwrap_or_else(|| estimate_usage(request, &content));

        Ok(Completion {
            model: ModelName::new(self.provider.name()),
            content,
            usage,
        })
    }

    /// プロバイダを取得
    pub fn provider(&self) -> &P {
        &self.provider
    }
}
