//! LLMプロバイダのトレイト定義とリクエスト・レスポンスの型

use crate::domain::{ModelName, TokenUsage};
use crate::error::Error;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;
use std::path::Path;

/// base64 化した画像（data URL として送る）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// png / jpeg / webp / gif
    pub format: String,
    pub base64: String,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        Self {
            format: format.to_string(),
            base64: BASE64.encode(bytes),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:image/{};base64,{}", self.format, self.base64)
    }
}

/// 拡張子から画像形式を決める（不明なら png）
pub fn image_format_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "jpeg",
        Some("webp") => "webp",
        Some("gif") => "gif",
        _ => "png",
    }
}

/// 1 回分のチャットリクエスト（system 指示 + user のテキスト・画像）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system_instruction: String,
    pub text: String,
    pub image: Option<ImagePayload>,
    /// true なら response_format: json_object を要求する
    pub json_response: bool,
}

impl ChatRequest {
    pub fn new(system_instruction: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            text: text.into(),
            image: None,
            json_response: false,
        }
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// 1 モデルから得た応答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub model: ModelName,
    pub content: String,
    pub usage: TokenUsage,
}

/// LLMプロバイダのトレイト
///
/// 1 インスタンスが 1 モデルに対応する。フォールバックはこの値を並べて表現する。
pub trait LlmProvider: Send + Sync {
    /// モデル名（ログとレコードの provenance に使う）
    fn name(&self) -> &str;

    /// リクエストペイロードを生成
    fn make_request_payload(&self, request: &ChatRequest) -> Result<Value, Error>;

    /// HTTPリクエストを実行してレスポンス本文を取得
    ///
    /// レート制限は `Error::RateLimited`、その他の失敗は `Error::Http` で返す。
    fn make_http_request(&self, request_json: &str) -> Result<String, Error>;

    /// レスポンスからテキストを抽出（存在しなければ None）
    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error>;

    /// レスポンスのトークン使用量（報告が無ければ None）
    fn parse_usage(&self, _response_json: &str) -> Option<TokenUsage> {
        None
    }
}

impl<P: LlmProvider + ?Sized> LlmProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn make_request_payload(&self, request: &ChatRequest) -> Result<Value, Error> {
        (**self).make_request_payload(request)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        (**self).make_http_request(request_json)
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        (**self).parse_response_text(response_json)
    }

    fn parse_usage(&self, response_json: &str) -> Option<TokenUsage> {
        (**self).parse_usage(response_json)
    }
}
