//! 標準時刻・スリープ実装と、テスト用の固定時刻

use crate::ports::outbound::{Clock, Sleeper};
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// システム時刻を使う Clock 実装
#[derive(Debug, Clone, Default)]
pub struct StdClock;

impl Clock for StdClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 常に同じ時刻を返す Clock（テスト・再集約用）
#[derive(Debug, Clone)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// std::thread::sleep を委譲する Sleeper
#[derive(Debug, Clone, Default)]
pub struct StdSleeper;

impl Sleeper for StdSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 待たずに要求された時間だけ記録する Sleeper（テスト用）
#[derive(Debug, Default)]
pub struct NoopSleeper {
    requested: Mutex<Vec<Duration>>,
}

impl NoopSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに要求された待機時間
    pub fn requested(&self) -> Vec<Duration> {
        self.requested
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for NoopSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut v) = self.requested.lock() {
            v.push(duration);
        }
    }
}
