//! ファイルに置く NotesStore 実装
//!
//! 保存は一時ファイルに書いてから rename する（読み手が書きかけを見ない）。

use crate::ports::outbound::NotesStore;
use common::error::Error;
use common::ports::outbound::FileSystem;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct FileNotesStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileNotesStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("notes"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl NotesStore for FileNotesStore {
    fn load(&self) -> Result<String, Error> {
        if !self.fs.exists(&self.path) {
            return Ok(String::new());
        }
        self.fs.read_to_string(&self.path)
    }

    fn save(&self, notes: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                self.fs.create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        self.fs.write(&tmp, notes)?;
        self.fs.rename(&tmp, &self.path)
    }
}
