//! 監視ループ: 取得 → 解析 → EventLog 追記 → 待機
//!
//! サイクル内のエラーはログに残して固定時間待ち、次のサイクルへ進む。

use crate::ports::outbound::{ImagePruner, ScreenshotSource};
use crate::usecase::analyze::Analyzer;
use common::cycle::sleep_interruptibly;
use common::domain::Event;
use common::error::Error;
use common::jsonl::EventLog;
use common::ports::outbound::{InterruptChecker, Log, LogLevel, LogRecord, Sleeper};
use std::sync::Arc;
use std::time::Duration;

/// 何サイクルごとに画像を整理するか
pub const RETENTION_EVERY: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct LoopTiming {
    pub interval: Duration,
    pub boot_wait: Duration,
    pub error_backoff: Duration,
}

pub struct MonitorLoop {
    pub source: Arc<dyn ScreenshotSource>,
    pub analyzer: Analyzer,
    pub event_log: EventLog,
    pub pruner: Arc<dyn ImagePruner>,
    pub sleeper: Arc<dyn Sleeper>,
    pub interrupt: Arc<dyn InterruptChecker>,
    pub log: Arc<dyn Log>,
    pub timing: LoopTiming,
}

impl MonitorLoop {
    /// 1 サイクル: 取得して解析し、結果を追記する
    ///
    /// 取得失敗は Err。追記失敗はログのみ（Event は返す）。
    pub fn run_cycle(&self) -> Result<Event, Error> {
        let image_path = self.source.capture()?;
        let event = self.analyzer.analyze(&image_path);
        if let Err(e) = self.event_log.append(&event) {
            self.emit(
                LogRecord::new(LogLevel::Error, "failed to append event")
                    .with_kind("persistence")
                    .with_field("path", self.event_log.path().display().to_string())
                    .with_field("error", e.to_string()),
            );
        }
        Ok(event)
    }

    /// ループを回す。`max_cycles` が Some なら、その回数で終了する。
    /// 戻り値は完了したサイクル数（失敗したサイクルを含む）。
    pub fn run(&self, max_cycles: Option<u64>) -> u64 {
        self.emit(
            LogRecord::new(LogLevel::Info, "monitor loop starting")
                .with_kind("lifecycle")
                .with_field("interval_secs", self.timing.interval.as_secs_f64())
                .with_field("boot_wait_secs", self.timing.boot_wait.as_secs_f64()),
        );

        if !self.timing.boot_wait.is_zero()
            && !sleep_interruptibly(&*self.sleeper, &*self.interrupt, self.timing.boot_wait)
        {
            self.emit(
                LogRecord::new(LogLevel::Info, "interrupted during boot wait").with_kind("lifecycle"),
            );
            return 0;
        }

        let mut cycles = 0u64;
        while !self.interrupt.is_interrupted() {
            let wait = match self.run_cycle() {
                Ok(_) => self.timing.interval,
                Err(e) => {
                    self.emit(
                        LogRecord::new(LogLevel::Error, "capture cycle failed")
                            .with_kind("lifecycle")
                            .with_field("error", e.to_string()),
                    );
                    self.timing.error_backoff
                }
            };
            cycles += 1;

            if cycles % RETENTION_EVERY == 0 {
                if let Err(e) = self.pruner.prune() {
                    self.emit(
                        LogRecord::new(LogLevel::Error, "image cleanup failed")
                            .with_kind("retention")
                            .with_field("error", e.to_string()),
                    );
                }
            }

            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
            if !sleep_interruptibly(&*self.sleeper, &*self.interrupt, wait) {
                break;
            }
        }

        self.emit(
            LogRecord::new(LogLevel::Info, "monitor loop stopped")
                .with_kind("lifecycle")
                .with_field("cycles", cycles),
        );
        cycles
    }

    fn emit(&self, record: LogRecord) {
        let _ = self.log.log(&record.with_layer("usecase"));
    }
}
