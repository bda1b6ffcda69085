//! ファイルシステム Outbound ポート
//!
//! usecase はこの trait 経由でのみファイル I/O を行う。

use crate::error::Error;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// ファイルメタデータ（サイズ・種別・更新時刻）
#[derive(Debug, Clone)]
pub struct FileMetadata {
    len: u64,
    is_file: bool,
    is_dir: bool,
    modified: Option<SystemTime>,
}

impl FileMetadata {
    pub fn new(len: u64, is_file: bool, is_dir: bool, modified: Option<SystemTime>) -> Self {
        Self {
            len,
            is_file,
            is_dir,
            modified,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_file(&self) -> bool {
        self.is_file
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }
}

/// ファイルシステム抽象（Outbound ポート）
///
/// 実装は `common::adapter::StdFileSystem`。
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, Error>;
    fn read(&self, path: &Path) -> Result<Vec<u8>, Error>;
    fn write(&self, path: &Path, contents: &str) -> Result<(), Error>;
    fn rename(&self, from: &Path, to: &Path) -> Result<(), Error>;
    fn create_dir_all(&self, path: &Path) -> Result<(), Error>;
    fn metadata(&self, path: &Path) -> Result<FileMetadata, Error>;
    fn remove_file(&self, path: &Path) -> Result<(), Error>;
    /// ディレクトリ直下のエントリのフルパス一覧
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, Error>;
    /// 追記用に開く（存在しなければ作成）。返した Writer を drop すると閉じる。
    fn open_append(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>, Error>;

    /// パスが存在するか（metadata が取れれば true）
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }
}
