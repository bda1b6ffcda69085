//! スクリーンショット 1 枚の解析結果（EventLog の 1 行）

use super::{ModelName, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 失敗を表すスコア。内容に対する評価としては使わない。
pub const FAILURE_SCORE: u8 = 0;
pub const MIN_EVENT_SCORE: u8 = 1;
pub const MAX_EVENT_SCORE: u8 = 10;

/// 画面に映っているチームメンバー 1 体分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub custom_name: String,
    #[serde(default)]
    pub health: String,
}

/// 解析済みイベント
///
/// 画像のバイト列は持たずパスだけを保持する。追記後は変更しない。
/// 集約時の `id` / 相対時刻はここには持たせない（集約側のエントリ型が持つ）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub image_path: PathBuf,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model: Option<ModelName>,
    #[serde(default)]
    pub detailed_summary: String,
    #[serde(default)]
    pub team_details: Vec<TeamMember>,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub estimated_location: String,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

impl Event {
    /// 全モデルが失敗したときのイベント（score=0、テキストは空、model=null）
    pub fn failure(image_path: impl AsRef<Path>, timestamp: DateTime<Utc>) -> Self {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            timestamp,
            model: None,
            detailed_summary: String::new(),
            team_details: Vec::new(),
            score: FAILURE_SCORE,
            estimated_location: String::new(),
            token_usage: TokenUsage::default(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.score == FAILURE_SCORE && self.model.is_none()
    }

    /// 集約対象になる内容を持っているか
    pub fn has_summary(&self) -> bool {
        !self.detailed_summary.is_empty()
    }
}
