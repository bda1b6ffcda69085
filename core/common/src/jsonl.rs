//! 追記専用 JSONL ファイル（EventLog / PostLog）
//!
//! 1 レコード 1 行。読み出しは毎回全件の線形スキャンで、壊れた行は読み飛ばして件数だけ数える。
//! 書き手は 1 ファイルにつき 1 プロセスを前提とし、ロックは取らない。

use crate::domain::{Event, Post};
use crate::error::Error;
use crate::ports::outbound::FileSystem;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 寛容パースの結果
#[derive(Debug, Clone)]
pub struct JsonlParseOutcome<T> {
    pub items: Vec<T>,
    pub skipped_lines: usize,
    /// (1 始まりの行番号, エラー内容)
    pub first_error: Option<(usize, String)>,
}

impl<T> JsonlParseOutcome<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            skipped_lines: 0,
            first_error: None,
        }
    }
}

/// 行ごとにパースし、失敗した行は飛ばす（空行は数えない）
///
/// バイト列のまま行に分けるので、書きかけで UTF-8 が途切れた行もその 1 行だけの失敗になる。
pub fn parse_jsonl_tolerant<T>(raw: &[u8]) -> JsonlParseOutcome<T>
where
    T: DeserializeOwned,
{
    let mut outcome = JsonlParseOutcome::empty();
    for (line_no, line) in raw.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<T>(line) {
            Ok(value) => outcome.items.push(value),
            Err(err) => {
                outcome.skipped_lines += 1;
                if outcome.first_error.is_none() {
                    outcome.first_error = Some((line_no + 1, err.to_string()));
                }
            }
        }
    }
    outcome
}

/// 型付きの追記専用 JSONL ファイル
pub struct JsonlFile<T> {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

/// 解析済みイベントのログ
pub type EventLog = JsonlFile<Event>;
/// 投稿判定のログ
pub type PostLog = JsonlFile<Post>;

impl<T> JsonlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1 レコードを 1 行として追記する。親ディレクトリが無ければ作る。
    pub fn append(&self, record: &T) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut w = self.fs.open_append(&self.path)?;
        // 1 回の write_all で行ごと書く（途中で他の書き手と混ざりにくくする）
        w.write_all(line.as_bytes()).map_err(|e| {
            Error::io_msg(format!("Failed to append to '{}': {}", self.path.display(), e))
        })?;
        w.flush().map_err(|e| Error::io_msg(e.to_string()))?;
        Ok(())
    }

    /// 全行を読む。ファイルが無ければ空。
    pub fn read_all(&self) -> Result<JsonlParseOutcome<T>, Error> {
        if !self.fs.exists(&self.path) {
            return Ok(JsonlParseOutcome::empty());
        }
        let raw = self.fs.read(&self.path)?;
        Ok(parse_jsonl_tolerant(&raw))
    }
}
