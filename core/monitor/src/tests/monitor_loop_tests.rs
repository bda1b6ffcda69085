//! MonitorLoop のテスト（取得・整理・待機・割り込みはフェイク）

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::adapter::{FixedClock, MemoryLog, NoopInterruptChecker, NoopSleeper, StdFileSystem};
use common::domain::Event;
use common::error::Error;
use common::jsonl::EventLog;
use common::llm::echo::EchoProvider;
use common::llm::FallbackChain;
use common::ports::outbound::{InterruptChecker, LogLevel};

use crate::ports::outbound::{ImagePruner, ScreenshotSource};
use crate::usecase::analyze::Analyzer;
use crate::usecase::monitor_loop::{LoopTiming, MonitorLoop, RETENTION_EVERY};

/// 毎回同じ画像を返す。fail が true なら取得失敗。
struct FakeSource {
    image: PathBuf,
    fail: bool,
}

impl ScreenshotSource for FakeSource {
    fn capture(&self) -> Result<PathBuf, Error> {
        if self.fail {
            Err(Error::io_msg("capture command exited with status 1"))
        } else {
            Ok(self.image.clone())
        }
    }
}

#[derive(Default)]
struct CountingPruner {
    calls: AtomicUsize,
}

impl ImagePruner for CountingPruner {
    fn prune(&self) -> Result<usize, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

struct StopFlag(AtomicBool);

impl InterruptChecker for StopFlag {
    fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Fixture {
    monitor: MonitorLoop,
    sleeper: Arc<NoopSleeper>,
    pruner: Arc<CountingPruner>,
    log: Arc<MemoryLog>,
    event_log_path: PathBuf,
}

fn fixture(dir: &Path, fail_capture: bool, timing: LoopTiming) -> Fixture {
    let image = dir.join("shot.png");
    std::fs::write(&image, b"png").unwrap();
    let fs = Arc::new(StdFileSystem);
    let log = Arc::new(MemoryLog::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 2, 20, 18, 0, 0).unwrap()));
    let chain = FallbackChain::new(
        "analysis",
        vec![Box::new(EchoProvider::replying(
            "m1",
            r#"{"detailed_summary": "Walking through Viridian Forest", "score": 3}"#,
        ))],
        log.clone(),
    );
    let analyzer = Analyzer::new(chain, fs.clone(), clock, log.clone(), "rubric");
    let event_log_path = dir.join("monitor/context.jsonl");
    let sleeper = Arc::new(NoopSleeper::new());
    let pruner = Arc::new(CountingPruner::default());

    let monitor = MonitorLoop {
        source: Arc::new(FakeSource {
            image,
            fail: fail_capture,
        }),
        analyzer,
        event_log: EventLog::new(fs, &event_log_path),
        pruner: pruner.clone(),
        sleeper: sleeper.clone(),
        interrupt: Arc::new(NoopInterruptChecker),
        log: log.clone(),
        timing,
    };
    Fixture {
        monitor,
        sleeper,
        pruner,
        log,
        event_log_path,
    }
}

fn timing(interval_secs: u64, boot_wait_secs: u64) -> LoopTiming {
    LoopTiming {
        interval: Duration::from_secs(interval_secs),
        boot_wait: Duration::from_secs(boot_wait_secs),
        error_backoff: Duration::from_secs(60),
    }
}

fn total(sleeps: &[Duration]) -> Duration {
    sleeps.iter().sum()
}

fn read_events(path: &Path) -> Vec<Event> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_single_cycle_appends_event_without_sleeping() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture(dir.path(), false, timing(30, 0));

    assert_eq!(f.monitor.run(Some(1)), 1);

    let events = read_events(&f.event_log_path);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].score, 3);
    assert_eq!(events[0].detailed_summary, "Walking through Viridian Forest");
    assert!(f.sleeper.requested().is_empty());
}

#[test]
fn test_boot_wait_then_interval_between_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture(dir.path(), false, timing(30, 90));

    assert_eq!(f.monitor.run(Some(2)), 2);

    // 起動待ち 90 秒 + サイクル間 30 秒（最後のサイクルの後は待たない）
    assert_eq!(total(&f.sleeper.requested()), Duration::from_secs(120));
    assert_eq!(read_events(&f.event_log_path).len(), 2);
}

#[test]
fn test_capture_error_is_logged_and_backs_off() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture(dir.path(), true, timing(30, 0));

    assert_eq!(f.monitor.run(Some(2)), 2);

    assert_eq!(total(&f.sleeper.requested()), Duration::from_secs(60));
    assert!(!f.event_log_path.exists());
    assert_eq!(
        f.log
            .messages_at(LogLevel::Error)
            .iter()
            .filter(|m| m.as_str() == "capture cycle failed")
            .count(),
        2
    );
}

#[test]
fn test_retention_runs_every_thirty_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture(dir.path(), false, timing(0, 0));

    assert_eq!(f.monitor.run(Some(RETENTION_EVERY * 2 + 1)), RETENTION_EVERY * 2 + 1);
    assert_eq!(f.pruner.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_interrupted_loop_runs_no_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = fixture(dir.path(), false, timing(30, 0));
    f.monitor.interrupt = Arc::new(StopFlag(AtomicBool::new(true)));

    assert_eq!(f.monitor.run(None), 0);
    assert!(!f.event_log_path.exists());
}

#[test]
fn test_run_cycle_returns_event() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture(dir.path(), false, timing(30, 0));
    let event = f.monitor.run_cycle().unwrap();
    assert_eq!(event.model.as_ref().map(|m| m.as_str()), Some("m1"));
}
