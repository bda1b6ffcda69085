//! 環境変数解決 Outbound ポート
//!
//! 設定の組み立て（config）はこの trait 経由でのみ環境変数を読む。

/// 環境変数解決抽象（Outbound ポート）
///
/// 実装は `common::adapter::StdEnvResolver` やテスト用の `MapEnvResolver`。
pub trait EnvResolver: Send + Sync {
    /// 値を返す。未設定・空文字列は None
    fn var(&self, name: &str) -> Option<String>;
}
