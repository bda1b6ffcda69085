//! 標準ファイルシステム実装（std::fs を委譲）

use crate::error::Error;
use crate::ports::outbound::{FileMetadata, FileSystem};
use std::path::{Path, PathBuf};

/// 標準ライブラリの fs をそのまま委譲する FileSystem 実装
#[derive(Debug, Clone, Default)]
pub struct StdFileSystem;

fn io_error(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::io_msg(format!("cannot {} {}: {}", action, path.display(), e))
}

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, Error> {
        std::fs::read_to_string(path).map_err(|e| io_error("read", path, e))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, Error> {
        std::fs::read(path).map_err(|e| io_error("read", path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), Error> {
        std::fs::write(path, contents).map_err(|e| io_error("write", path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
        std::fs::rename(from, to)
            .map_err(|e| io_error(&format!("move {} to", from.display()), to, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), Error> {
        std::fs::create_dir_all(path).map_err(|e| io_error("create directory", path, e))
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata, Error> {
        let m = std::fs::metadata(path).map_err(|e| io_error("stat", path, e))?;
        Ok(FileMetadata::new(m.len(), m.is_file(), m.is_dir(), m.modified().ok()))
    }

    fn remove_file(&self, path: &Path) -> Result<(), Error> {
        std::fs::remove_file(path).map_err(|e| io_error("remove", path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, Error> {
        std::fs::read_dir(path)
            .map_err(|e| io_error("list", path, e))?
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .map_err(|e| io_error("list", path, e))
            })
            .collect()
    }

    /// 毎回開き直す（ローテーションや削除後も作り直される）
    fn open_append(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>, Error> {
        let f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_error("append to", path, e))?;
        Ok(Box::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_append_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        let fs = StdFileSystem;
        fs.open_append(&path).unwrap().write_all(b"one\n").unwrap();
        fs.open_append(&path).unwrap().write_all(b"two\n").unwrap();
        assert_eq!(fs.read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_metadata_reports_modified_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        let fs = StdFileSystem;
        fs.write(&path, "png").unwrap();
        let m = fs.metadata(&path).unwrap();
        assert!(m.is_file());
        assert_eq!(m.len(), 3);
        assert!(m.modified().is_some());
        assert!(!fs.exists(&dir.path().join("missing.png")));
    }
}
