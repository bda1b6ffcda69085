use common::error::Error;

/// 配信についての長期メモ（1 つの文字列）
///
/// 最後に書いた内容が勝つ。書き込みは丸ごと置き換え。
pub trait NotesStore: Send + Sync {
    /// 現在のノート。未作成なら空文字列。
    fn load(&self) -> Result<String, Error>;
    fn save(&self, notes: &str) -> Result<(), Error>;
}
