//! 人間向けログ（LogRecord → stderr に 1 行）と、複数の Log への複製
//!
//! fields の全量は出さず要点のみ（巨大化防止）。

use crate::error::Error;
use crate::ports::outbound::{Log, LogRecord};
use std::sync::Arc;

const FIELDS_SUMMARY_MAX: usize = 400;

/// fields を短い文字列にする
fn fields_summary(record: &LogRecord) -> String {
    let Some(fields) = record.fields.as_ref().filter(|f| !f.is_empty()) else {
        return String::new();
    };
    let s = fields
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join(" ");
    if s.len() <= FIELDS_SUMMARY_MAX {
        return s;
    }
    let truncated = s.chars().take(FIELDS_SUMMARY_MAX).collect::<String>();
    format!("{}... (len={})", truncated, s.len())
}

/// 1 レコードを人間向けの 1 行に整形する
pub fn format_human(record: &LogRecord) -> String {
    let mut line = format!("{} [{}]", record.ts, record.level.as_str());
    if let Some(layer) = &record.layer {
        line.push(' ');
        line.push_str(layer);
        line.push(':');
    }
    line.push(' ');
    line.push_str(&record.message);
    let summary = fields_summary(record);
    if !summary.is_empty() {
        line.push_str(" (");
        line.push_str(&summary);
        line.push(')');
    }
    line
}

/// stderr に整形して出力する Log 実装
#[derive(Debug, Clone, Default)]
pub struct HumanLog;

impl HumanLog {
    pub fn new() -> Self {
        Self
    }
}

impl Log for HumanLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        eprintln!("{}", format_human(record));
        Ok(())
    }
}

/// 複数の Log に同じレコードを流す
///
/// 1 つが失敗しても残りには書き、最初のエラーを返す。
pub struct FanoutLog {
    logs: Vec<Arc<dyn Log>>,
}

impl FanoutLog {
    pub fn new(logs: Vec<Arc<dyn Log>>) -> Self {
        Self { logs }
    }
}

impl Log for FanoutLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        let mut first_err = None;
        for log in &self.logs {
            if let Err(e) = log.log(record) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
