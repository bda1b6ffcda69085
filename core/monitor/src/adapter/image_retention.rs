//! 画像ディレクトリの保持数制限
//!
//! `*.png` を更新時刻順に並べ、新しい `keep` 枚だけ残す。削除の失敗は警告ログにして続行。

use crate::ports::outbound::ImagePruner;
use common::error::Error;
use common::ports::outbound::{FileSystem, Log, LogLevel, LogRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

pub struct RetentionPruner {
    fs: Arc<dyn FileSystem>,
    log: Arc<dyn Log>,
    dir: PathBuf,
    keep: usize,
}

impl RetentionPruner {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        log: Arc<dyn Log>,
        dir: impl AsRef<Path>,
        keep: usize,
    ) -> Self {
        Self {
            fs,
            log,
            dir: dir.as_ref().to_path_buf(),
            keep,
        }
    }

    /// 古い順に並べた PNG 一覧
    fn images_oldest_first(&self) -> Result<Vec<PathBuf>, Error> {
        let mut images: Vec<(Option<SystemTime>, PathBuf)> = Vec::new();
        for path in self.fs.read_dir(&self.dir)? {
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
            if !is_png {
                continue;
            }
            let meta = self.fs.metadata(&path)?;
            if meta.is_file() {
                images.push((meta.modified(), path));
            }
        }
        images.sort();
        Ok(images.into_iter().map(|(_, p)| p).collect())
    }
}

impl ImagePruner for RetentionPruner {
    fn prune(&self) -> Result<usize, Error> {
        if !self.fs.exists(&self.dir) {
            return Ok(0);
        }
        let images = self.images_oldest_first()?;
        if images.len() <= self.keep {
            return Ok(0);
        }

        let excess = images.len() - self.keep;
        let mut removed = 0;
        for old in &images[..excess] {
            match self.fs.remove_file(old) {
                Ok(()) => removed += 1,
                Err(e) => {
                    let _ = self.log.log(
                        &LogRecord::new(LogLevel::Warn, "failed to remove old image")
                            .with_layer("adapter")
                            .with_kind("retention")
                            .with_field("path", old.display().to_string())
                            .with_field("error", e.to_string()),
                    );
                }
            }
        }

        let _ = self.log.log(
            &LogRecord::new(LogLevel::Info, "cleaned up old images")
                .with_layer("adapter")
                .with_kind("retention")
                .with_field("removed", removed)
                .with_field("keep", self.keep),
        );
        Ok(removed)
    }
}
