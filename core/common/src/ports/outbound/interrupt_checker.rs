//! SIGINT / SIGTERM 等による停止要求を検知する Outbound ポート
//!
//! ポーリングループは反復の境目でこれを参照し、true なら現在のサイクルを終えてから抜ける。
//! 実行中の HTTP リクエストは中断しない。

/// 停止が要求されたかどうかを返す能力
pub trait InterruptChecker: Send + Sync {
    fn is_interrupted(&self) -> bool;
}
