//! サブプロセス実行の抽象（Outbound ポート）
//!
//! スクリーンショット取得コマンドなど、外部コマンド起動を trait で抽象化する。

use crate::error::Error;
use std::path::Path;

/// サブプロセス実行の抽象
///
/// 実装は `common::adapter::StdProcess`（std::process::Command）など。
pub trait Process: Send + Sync {
    /// プログラムを引数と追加の環境変数付きで実行し、終了コードを返す
    fn run(&self, program: &Path, args: &[String], envs: &[(String, String)]) -> Result<i32, Error>;
}
