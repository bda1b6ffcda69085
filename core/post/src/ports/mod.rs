//! Ports & Adapters のポート定義
//!
//! - outbound: ノートの保存先と投稿先（common の FileSystem / Clock / Log 等も利用）

pub mod outbound;
