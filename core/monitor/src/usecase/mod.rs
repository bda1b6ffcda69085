//! ユースケース: スクリーンショットの解析と監視ループ

pub mod analyze;
pub mod monitor_loop;
