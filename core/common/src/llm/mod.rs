//! LLM バックエンド（Chat Completions 互換）とフォールバックチェーン
//!
//! プロバイダはリクエスト生成・HTTP・レスポンス解釈だけを担当し、
//! 「どのモデルを順に試すか」は FallbackChain が持つ。

pub mod chain;
pub mod config;
pub mod driver;
pub mod echo;
pub mod factory;
pub mod openai_compat;
pub mod provider;

pub use chain::FallbackChain;
pub use config::BackendsConfig;
pub use driver::LlmDriver;
pub use factory::create_providers;
pub use provider::{ChatRequest, Completion, ImagePayload, LlmProvider};
