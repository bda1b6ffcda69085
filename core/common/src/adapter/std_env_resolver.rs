//! 標準環境変数解決実装（std::env を委譲）と、テスト用のマップ実装

use crate::ports::outbound::EnvResolver;
use std::collections::HashMap;
use std::env;

/// 標準環境変数解決実装
#[derive(Debug, Clone, Default)]
pub struct StdEnvResolver;

impl EnvResolver for StdEnvResolver {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }
}

/// 固定のキー・値から引く EnvResolver（テスト用）
#[derive(Debug, Clone, Default)]
pub struct MapEnvResolver {
    vars: HashMap<String, String>,
}

impl MapEnvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl EnvResolver for MapEnvResolver {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|s| !s.is_empty()).cloned()
    }
}
