use common::error::Error;

/// 古いスクリーンショットを削除する
pub trait ImagePruner: Send + Sync {
    /// 削除した枚数を返す
    fn prune(&self) -> Result<usize, Error>;
}
