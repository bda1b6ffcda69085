//! backends.json 用の設定型
//!
//! どのエンドポイントにどのモデルを順に投げるかを保持する。ファイルが無ければ既定値。

use crate::domain::ModelName;
use crate::error::Error;
use crate::llm::openai_compat::DEFAULT_BASE_URL;
use crate::ports::outbound::{EnvResolver, FileSystem};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_ANALYSIS_MODELS: &[&str] = &[
    "google/gemini-2.0-flash-lite-preview-02-05:free",
    "google/gemini-2.0-flash-001",
];

const DEFAULT_DECISION_MODELS: &[&str] = &[
    "deepseek/deepseek-r1:free",
    "google/gemini-2.0-flash-lite-preview-02-05:free",
    "google/gemini-2.0-flash-001",
];

/// バックエンド設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendsConfig {
    pub base_url: String,
    /// API キーを読む環境変数名
    pub api_key_env: String,
    /// 画像解析に使うモデル（先頭から順に試す）
    pub analysis_models: Vec<ModelName>,
    /// 投稿判断とノート更新に使うモデル
    pub decision_models: Vec<ModelName>,
    pub timeout: Duration,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            analysis_models: to_models(DEFAULT_ANALYSIS_MODELS),
            decision_models: to_models(DEFAULT_DECISION_MODELS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn to_models(names: &[&str]) -> Vec<ModelName> {
    names.iter().map(|n| ModelName::new(*n)).collect()
}

/// serde 用の内部構造（省略されたキーは既定値で埋める）
#[derive(Debug, Deserialize)]
struct BackendsConfigRaw {
    #[serde(alias = "endpoint")]
    base_url: Option<String>,
    api_key_env: Option<String>,
    #[serde(alias = "monitor_models", alias = "vision_models")]
    analysis_models: Option<Vec<String>>,
    #[serde(alias = "post_models")]
    decision_models: Option<Vec<String>>,
    #[serde(alias = "timeout")]
    timeout_secs: Option<u64>,
}

impl BackendsConfig {
    /// JSON 文字列からパース
    pub fn parse(json: &str) -> Result<Self, Error> {
        let raw: BackendsConfigRaw = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid backends config: {}", e)))?;
        let defaults = Self::default();

        let models = |list: Option<Vec<String>>, fallback: Vec<ModelName>, key: &str| {
            match list {
                Some(names) if names.iter().all(|n| n.trim().is_empty()) => Err(Error::config(
                    format!("backends config: {} must name at least one model", key),
                )),
                Some(names) => Ok(names
                    .into_iter()
                    .filter(|n| !n.trim().is_empty())
                    .map(|n| ModelName::new(n.trim()))
                    .collect()),
                None => Ok(fallback),
            }
        };

        Ok(Self {
            base_url: raw.base_url.unwrap_or(defaults.base_url),
            api_key_env: raw.api_key_env.unwrap_or(defaults.api_key_env),
            analysis_models: models(
                raw.analysis_models,
                defaults.analysis_models,
                "analysis_models",
            )?,
            decision_models: models(
                raw.decision_models,
                defaults.decision_models,
                "decision_models",
            )?,
            timeout: raw
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }

    /// パスが指定されていればファイルを読んでパース、無ければ既定値
    pub fn load(fs: &dyn FileSystem, path: Option<&Path>) -> Result<Self, Error> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let text = fs.read_to_string(p).map_err(|e| {
                    Error::config(format!("cannot read backends config {}: {}", p.display(), e))
                })?;
                Self::parse(&text)
            }
        }
    }

    /// API キーを環境変数から読む。無ければ Config エラー（ループに入る前に終了させる）。
    pub fn resolve_api_key(&self, env: &dyn EnvResolver) -> Result<String, Error> {
        env.var(&self.api_key_env)
            .ok_or_else(|| Error::config(format!("{} is not set", self.api_key_env)))
    }
}
