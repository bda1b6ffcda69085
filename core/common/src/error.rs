//! エラーハンドリング
//!
//! 全レイヤー共通のエラー型。終了コードは sysexits.h に合わせる。

use thiserror::Error as ThisError;

/// エラー型
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// 引数不正（EX_USAGE）
    #[error("{0}")]
    InvalidArgs(String),
    /// 必須設定の欠落・不正（EX_CONFIG）。ループに入る前に終了する。
    #[error("configuration error: {0}")]
    Config(String),
    /// 環境変数まわり
    #[error("{0}")]
    Env(String),
    /// ファイル I/O
    #[error("{0}")]
    Io(String),
    /// バックエンドのレート制限（HTTP 429）
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// その他の HTTP / トランスポート失敗
    #[error("{0}")]
    Http(String),
    /// JSON のパース・シリアライズ失敗
    #[error("{0}")]
    Json(String),
    /// モデル出力の形が期待と違う
    #[error("invalid response: {0}")]
    Validation(String),
    /// システムエラー（EX_SOFTWARE）
    #[error("{0}")]
    System(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn env(msg: impl Into<String>) -> Self {
        Self::Env(msg.into())
    }

    pub fn io_msg(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    /// プロセス終了コード
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgs(_) => 64,
            Self::Json(_) | Self::Validation(_) => 65,
            Self::Http(_) | Self::RateLimited(_) => 69,
            Self::System(_) => 70,
            Self::Io(_) => 74,
            Self::Config(_) | Self::Env(_) => 78,
        }
    }

    /// 使い方の表示が必要なエラーか
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
