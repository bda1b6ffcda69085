//! 投稿判定 1 回分の結果（PostLog の 1 行）

use super::{ModelName, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_POST_SCORE: u8 = 10;

/// 投稿判定レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model: Option<ModelName>,
    #[serde(default)]
    pub commentary: String,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub post: bool,
    /// 同じ集約サイクルのイベント id。ログ間で安定なキーではない。
    #[serde(default)]
    pub image_id: Option<u32>,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

impl Post {
    /// 全モデルが失敗したときのレコード
    pub fn failure(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            model: None,
            commentary: String::new(),
            score: 0,
            post: false,
            image_id: None,
            token_usage: TokenUsage::default(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.model.is_none() && self.score == 0 && self.commentary.is_empty()
    }
}
