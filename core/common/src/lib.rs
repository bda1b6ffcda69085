//! 配信実況パイプライン共通ライブラリ
//!
//! `monitor`（スクリーンショット解析）と `post`（投稿判断）で共有される機能を提供します。

/// エラーハンドリング
pub mod error;

/// Event / Post などの記録型
pub mod domain;

/// モデル出力の検証と正規化
pub mod validate;

/// 追記専用 JSONL ログ
pub mod jsonl;

/// LLMドライバーとプロバイダ
pub mod llm;

/// CLI・環境変数からの設定値の解決
pub mod settings;

/// ポーリングループの待機と割り込み
pub mod cycle;

/// Outbound ポート（trait）
pub mod ports;

/// ポートの標準実装
pub mod adapter;
