//! プロバイダファクトリー
//!
//! BackendsConfig とモデル名の並びから、フォールバックチェーン用のプロバイダ列を作る。

use crate::domain::ModelName;
use crate::error::Error;
use crate::llm::config::BackendsConfig;
use crate::llm::openai_compat::OpenAiCompatProvider;
use crate::llm::provider::LlmProvider;

/// モデルごとに OpenAI 互換プロバイダを作成する（順序は models のまま）
pub fn create_providers(
    config: &BackendsConfig,
    models: &[ModelName],
    api_key: &str,
) -> Result<Vec<Box<dyn LlmProvider>>, Error> {
    if models.is_empty() {
        return Err(Error::config("no backend models configured"));
    }
    models
        .iter()
        .map(|model| {
            let provider = OpenAiCompatProvider::new(
                model.clone(),
                Some(config.base_url.clone()),
                Some(api_key.to_string()),
                config.timeout,
            )?;
            Ok(Box::new(provider) as Box<dyn LlmProvider>)
        })
        .collect()
}
