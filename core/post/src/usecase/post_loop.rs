//! 投稿ループ: ノート読込 → 集約 → 判断 → 投稿 → ノート更新 → 待機

use crate::ports::outbound::{NotesStore, Publisher};
use crate::usecase::aggregate::ContextAggregator;
use crate::usecase::decide::PostDecisionEngine;
use common::cycle::sleep_interruptibly;
use common::domain::Post;
use common::error::Error;
use common::ports::outbound::{Clock, InterruptChecker, Log, LogLevel, LogRecord, Sleeper};
use std::sync::Arc;
use std::time::Duration;

/// 投稿してよいか
///
/// 投稿が有効・実況文が空でない・モデルが post=true・サイクル開始時のノートが空でない、のすべてを満たすとき。
pub fn publish_gate(enabled: bool, post: &Post, notes: &str) -> bool {
    enabled && !post.commentary.trim().is_empty() && post.post && !notes.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostLoopSettings {
    pub interval: Duration,
    pub window: chrono::Duration,
    pub limit: Option<usize>,
    pub publish_enabled: bool,
    pub error_backoff: Duration,
}

/// 1 サイクルの結果
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// 窓内に Event が無くモデルを呼ばなかった
    NoContext,
    Decided {
        post: Post,
        published: bool,
        notes_updated: bool,
    },
}

pub struct PostLoop {
    pub aggregator: ContextAggregator,
    pub engine: PostDecisionEngine,
    pub notes: Arc<dyn NotesStore>,
    pub publisher: Arc<dyn Publisher>,
    pub clock: Arc<dyn Clock>,
    pub sleeper: Arc<dyn Sleeper>,
    pub interrupt: Arc<dyn InterruptChecker>,
    pub log: Arc<dyn Log>,
    pub settings: PostLoopSettings,
}

impl PostLoop {
    /// 1 サイクル。ノートが読めなければ Err（ループ側で待機して次へ）。
    pub fn run_cycle(&self) -> Result<CycleOutcome, Error> {
        let notes = self.notes.load()?;
        let context = self
            .aggregator
            .aggregate(self.clock.now(), self.settings.window, self.settings.limit);
        let context_text = context.to_string();

        let Some(post) = self.engine.decide(&context_text, &notes) else {
            return Ok(CycleOutcome::NoContext);
        };

        let published = if publish_gate(self.settings.publish_enabled, &post, &notes) {
            let image = post.image_id.and_then(|id| context.image_path_for(id));
            let ok = self.publisher.publish(&post.commentary, image);
            if !ok {
                self.emit(
                    LogRecord::new(LogLevel::Warn, "publish was not accepted").with_kind("publish"),
                );
            }
            ok
        } else {
            false
        };

        let mut notes_updated = false;
        if !post.is_failure() {
            if let Some(updated) = self.engine.update_notes(&context_text, &notes) {
                match self.notes.save(&updated) {
                    Ok(()) => notes_updated = true,
                    Err(e) => self.emit(
                        LogRecord::new(LogLevel::Error, "failed to save notes")
                            .with_kind("persistence")
                            .with_field("error", e.to_string()),
                    ),
                }
            }
        }

        Ok(CycleOutcome::Decided {
            post,
            published,
            notes_updated,
        })
    }

    /// ループを回す。`max_cycles` が Some なら、その回数で終了する。
    pub fn run(&self, max_cycles: Option<u64>) -> u64 {
        self.emit(
            LogRecord::new(LogLevel::Info, "post loop starting")
                .with_kind("lifecycle")
                .with_field("interval_secs", self.settings.interval.as_secs_f64())
                .with_field("window_secs", self.settings.window.num_seconds())
                .with_field("publish_enabled", self.settings.publish_enabled),
        );

        let mut cycles = 0u64;
        while !self.interrupt.is_interrupted() {
            let wait = match self.run_cycle() {
                Ok(outcome) => {
                    self.log_outcome(&outcome);
                    self.settings.interval
                }
                Err(e) => {
                    self.emit(
                        LogRecord::new(LogLevel::Error, "post cycle failed")
                            .with_kind("lifecycle")
                            .with_field("error", e.to_string()),
                    );
                    self.settings.error_backoff
                }
            };
            cycles += 1;

            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
            if !sleep_interruptibly(&*self.sleeper, &*self.interrupt, wait) {
                break;
            }
        }

        self.emit(
            LogRecord::new(LogLevel::Info, "post loop stopped")
                .with_kind("lifecycle")
                .with_field("cycles", cycles),
        );
        cycles
    }

    fn log_outcome(&self, outcome: &CycleOutcome) {
        let record = match outcome {
            CycleOutcome::NoContext => {
                LogRecord::new(LogLevel::Info, "cycle finished without context")
            }
            CycleOutcome::Decided {
                post,
                published,
                notes_updated,
            } => LogRecord::new(LogLevel::Info, "cycle finished")
                .with_field("score", post.score)
                .with_field("published", *published)
                .with_field("notes_updated", *notes_updated),
        };
        self.emit(record.with_kind("lifecycle"));
    }

    fn emit(&self, record: LogRecord) {
        let _ = self.log.log(&record.with_layer("usecase"));
    }
}
