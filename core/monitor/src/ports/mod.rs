//! Ports & Adapters のポート定義
//!
//! - outbound: スクリーンショット取得・画像の整理（common の FileSystem / Process / Log 等も利用）

pub mod outbound;
