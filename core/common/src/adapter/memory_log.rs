//! メモリに溜める Log 実装（テストでログ内容を検査するため）

use crate::error::Error;
use crate::ports::outbound::{Log, LogLevel, LogRecord};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    /// 指定レベルのメッセージだけ
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .map(|r| r.message)
            .collect()
    }
}

impl Log for MemoryLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        self.records
            .lock()
            .map_err(|_| Error::system("log buffer poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
