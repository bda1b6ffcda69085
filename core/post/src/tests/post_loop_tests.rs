//! 投稿ゲートと PostLoop のテスト

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::adapter::{FixedClock, MemoryLog, NoopInterruptChecker, NoopSleeper, StdFileSystem};
use common::domain::{ModelName, Post};
use common::error::Error;
use common::jsonl::{EventLog, PostLog};
use common::llm::echo::EchoProvider;
use common::llm::{FallbackChain, LlmProvider};
use common::ports::outbound::{InterruptChecker, LogLevel};

use super::fixtures::{event, now, write_log};
use crate::adapter::FileNotesStore;
use crate::ports::outbound::{NotesStore, Publisher};
use crate::usecase::aggregate::ContextAggregator;
use crate::usecase::decide::PostDecisionEngine;
use crate::usecase::post_loop::{publish_gate, CycleOutcome, PostLoop, PostLoopSettings};

/// 受け取った投稿を記録する Publisher
#[derive(Default)]
struct RecordingPublisher {
    accept: bool,
    sent: Mutex<Vec<(String, Option<PathBuf>)>>,
}

impl RecordingPublisher {
    fn accepting() -> Self {
        Self {
            accept: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, Option<PathBuf>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, text: &str, image: Option<&Path>) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((text.to_string(), image.map(Path::to_path_buf)));
        self.accept
    }
}

/// 読めない NotesStore
struct BrokenNotes;

impl NotesStore for BrokenNotes {
    fn load(&self) -> Result<String, Error> {
        Err(Error::io_msg("notes unavailable"))
    }

    fn save(&self, _notes: &str) -> Result<(), Error> {
        Err(Error::io_msg("notes unavailable"))
    }
}

/// n 回目の確認で割り込みを返す
struct InterruptAfter {
    checks: AtomicUsize,
    after: usize,
}

impl InterruptChecker for InterruptAfter {
    fn is_interrupted(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) >= self.after
    }
}

fn post(commentary: &str, post: bool) -> Post {
    Post {
        timestamp: now(),
        model: Some(ModelName::new("d1")),
        commentary: commentary.to_string(),
        score: 8,
        post,
        image_id: None,
        token_usage: Default::default(),
    }
}

#[test]
fn test_publish_gate() {
    assert!(publish_gate(true, &post("Brock falls!", true), "notes"));
    assert!(!publish_gate(false, &post("Brock falls!", true), "notes"));
    assert!(!publish_gate(true, &post("Brock falls!", false), "notes"));
    assert!(!publish_gate(true, &post("  ", true), "notes"));
    // 最初のサイクルはノートが空なので投稿しない
    assert!(!publish_gate(true, &post("Brock falls!", true), ""));
    assert!(!publish_gate(true, &post("Brock falls!", true), " \n"));
    assert!(!publish_gate(true, &Post::failure(now()), "notes"));
}

struct Harness {
    dir: tempfile::TempDir,
    log: Arc<MemoryLog>,
    sleeper: Arc<NoopSleeper>,
    publisher: Arc<RecordingPublisher>,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            log: Arc::new(MemoryLog::new()),
            sleeper: Arc::new(NoopSleeper::new()),
            publisher: Arc::new(RecordingPublisher::accepting()),
        }
    }

    fn event_log(&self) -> PathBuf {
        self.dir.path().join("monitor/context.jsonl")
    }

    fn post_log(&self) -> PathBuf {
        self.dir.path().join("post/post.jsonl")
    }

    fn notes_path(&self) -> PathBuf {
        self.dir.path().join("post/notes.txt")
    }

    fn write_notes(&self, notes: &str) {
        std::fs::create_dir_all(self.notes_path().parent().unwrap()).unwrap();
        std::fs::write(self.notes_path(), notes).unwrap();
    }

    fn build(
        &self,
        decision: Vec<EchoProvider>,
        notes: Vec<EchoProvider>,
        store: Arc<dyn NotesStore>,
        interrupt: Arc<dyn InterruptChecker>,
    ) -> PostLoop {
        let fs = Arc::new(StdFileSystem);
        let boxed = |v: Vec<EchoProvider>| -> Vec<Box<dyn LlmProvider>> {
            v.into_iter()
                .map(|p| Box::new(p) as Box<dyn LlmProvider>)
                .collect()
        };
        let clock = Arc::new(FixedClock::new(now()));
        std::fs::create_dir_all(self.post_log().parent().unwrap()).unwrap();
        PostLoop {
            aggregator: ContextAggregator::new(
                EventLog::new(fs.clone(), self.event_log()),
                self.log.clone(),
            ),
            engine: PostDecisionEngine::new(
                FallbackChain::new("decision", boxed(decision), self.log.clone()),
                FallbackChain::new("notes", boxed(notes), self.log.clone()),
                PostLog::new(fs, self.post_log()),
                clock.clone(),
                self.log.clone(),
                "decide",
                "take notes",
            ),
            notes: store,
            publisher: self.publisher.clone(),
            clock,
            sleeper: self.sleeper.clone(),
            interrupt,
            log: self.log.clone(),
            settings: PostLoopSettings {
                interval: Duration::from_secs(3),
                window: chrono::Duration::minutes(5),
                limit: None,
                publish_enabled: true,
                error_backoff: Duration::from_secs(2),
            },
        }
    }

    fn file_store(&self) -> Arc<dyn NotesStore> {
        Arc::new(FileNotesStore::new(Arc::new(StdFileSystem), self.notes_path()))
    }

    fn seed_events(&self) {
        write_log(
            &self.event_log(),
            &[
                event(4, 9, "Gym leader Brock is down to his last Pokemon."),
                event(1, 2, "Healing at the Pokemon Center."),
            ],
            &[],
        );
    }
}

#[test]
fn test_cycle_publishes_with_resolved_image_and_updates_notes() {
    let h = Harness::new();
    h.seed_events();
    h.write_notes("- fighting Brock");
    let looper = h.build(
        vec![EchoProvider::replying(
            "d1",
            r#"{"commentary":"Brock is on the ropes!","score":9,"post":true,"image_id":2}"#,
        )],
        vec![EchoProvider::replying("n1", "- Brock almost beaten")],
        h.file_store(),
        Arc::new(NoopInterruptChecker::new()),
    );

    let outcome = looper.run_cycle().unwrap();

    let CycleOutcome::Decided {
        post,
        published,
        notes_updated,
    } = outcome
    else {
        panic!("expected a decision");
    };
    assert!(published);
    assert!(notes_updated);
    assert_eq!(post.image_id, Some(2));
    assert_eq!(
        h.publisher.sent(),
        vec![(
            "Brock is on the ropes!".to_string(),
            Some(PathBuf::from("context/images/4.png"))
        )]
    );
    assert_eq!(
        std::fs::read_to_string(h.notes_path()).unwrap(),
        "- Brock almost beaten"
    );
}

#[test]
fn test_first_cycle_with_empty_notes_never_publishes() {
    let h = Harness::new();
    h.seed_events();
    let looper = h.build(
        vec![EchoProvider::replying(
            "d1",
            r#"{"commentary":"Big moment!","score":9,"post":true,"image_id":99}"#,
        )],
        vec![EchoProvider::replying("n1", "- first notes")],
        h.file_store(),
        Arc::new(NoopInterruptChecker::new()),
    );

    let outcome = looper.run_cycle().unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Decided {
            published: false,
            notes_updated: true,
            ..
        }
    ));
    assert!(h.publisher.sent().is_empty());
    assert_eq!(std::fs::read_to_string(h.notes_path()).unwrap(), "- first notes");
}

#[test]
fn test_unknown_image_id_publishes_text_only() {
    let h = Harness::new();
    h.seed_events();
    h.write_notes("notes");
    let looper = h.build(
        vec![EchoProvider::replying(
            "d1",
            r#"{"commentary":"Healing up.","score":6,"post":true,"image_id":7}"#,
        )],
        vec![],
        h.file_store(),
        Arc::new(NoopInterruptChecker::new()),
    );

    looper.run_cycle().unwrap();

    assert_eq!(h.publisher.sent(), vec![("Healing up.".to_string(), None)]);
}

#[test]
fn test_failed_decision_keeps_notes() {
    let h = Harness::new();
    h.seed_events();
    h.write_notes("keep me");
    let notes_model = EchoProvider::replying("n1", "overwritten");
    let notes_calls = notes_model.call_counter();
    let looper = h.build(
        vec![EchoProvider::failing("d1", "HTTP 500")],
        vec![notes_model],
        h.file_store(),
        Arc::new(NoopInterruptChecker::new()),
    );

    let outcome = looper.run_cycle().unwrap();

    let CycleOutcome::Decided {
        post,
        published,
        notes_updated,
    } = outcome
    else {
        panic!("expected a decision");
    };
    assert!(post.is_failure());
    assert!(!published);
    assert!(!notes_updated);
    assert_eq!(notes_calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_to_string(h.notes_path()).unwrap(), "keep me");
    assert!(h.post_log().exists());
}

#[test]
fn test_no_events_means_no_model_calls() {
    let h = Harness::new();
    let decision = EchoProvider::replying("d1", r#"{"commentary":"x","score":5,"post":true}"#);
    let calls = decision.call_counter();
    let looper = h.build(
        vec![decision],
        vec![],
        h.file_store(),
        Arc::new(NoopInterruptChecker::new()),
    );

    assert_eq!(looper.run_cycle().unwrap(), CycleOutcome::NoContext);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!h.post_log().exists());
}

#[test]
fn test_run_waits_interval_between_cycles() {
    let h = Harness::new();
    let looper = h.build(
        vec![],
        vec![],
        h.file_store(),
        Arc::new(NoopInterruptChecker::new()),
    );

    assert_eq!(looper.run(Some(2)), 2);

    // 1 秒刻みで 3 秒、最後のサイクルの後は待たない
    assert_eq!(h.sleeper.requested(), vec![Duration::from_secs(1); 3]);
    assert!(h
        .log
        .messages()
        .contains(&"cycle finished without context".to_string()));
}

#[test]
fn test_notes_load_failure_backs_off() {
    let h = Harness::new();
    let looper = h.build(
        vec![],
        vec![],
        Arc::new(BrokenNotes),
        Arc::new(NoopInterruptChecker::new()),
    );

    assert_eq!(looper.run(Some(2)), 2);

    assert_eq!(h.sleeper.requested(), vec![Duration::from_secs(1); 2]);
    assert_eq!(
        h.log
            .messages_at(LogLevel::Error)
            .iter()
            .filter(|m| m.as_str() == "post cycle failed")
            .count(),
        2
    );
}

#[test]
fn test_interrupt_stops_the_loop() {
    let h = Harness::new();
    let looper = h.build(
        vec![],
        vec![],
        h.file_store(),
        Arc::new(InterruptAfter {
            checks: AtomicUsize::new(0),
            after: 2,
        }),
    );

    let cycles = looper.run(None);

    assert_eq!(cycles, 1);
    assert!(h.log.messages().contains(&"post loop stopped".to_string()));
}
