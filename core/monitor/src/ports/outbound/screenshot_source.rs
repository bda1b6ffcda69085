use common::error::Error;
use std::path::PathBuf;

/// 配信のスクリーンショットを 1 枚取得する
///
/// 画像ファイルの所有は取得側。返したパスは EventLog に記録される。
pub trait ScreenshotSource: Send + Sync {
    fn capture(&self) -> Result<PathBuf, Error>;
}
