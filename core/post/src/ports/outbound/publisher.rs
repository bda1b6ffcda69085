use std::path::Path;

/// 承認された実況文を外部へ投稿する
///
/// 失敗は false で返す（呼び出し側はログに残すだけで再送しない）。
pub trait Publisher: Send + Sync {
    fn publish(&self, text: &str, image: Option<&Path>) -> bool;
}
