//! 配線: 標準アダプタで ContextAggregator / PostDecisionEngine / PostLoop を組み立てる

use std::sync::Arc;
use std::time::Duration;

use common::adapter::{
    FanoutLog, FileJsonLog, HumanLog, NoopInterruptChecker, SigintChecker, StdClock,
    StdEnvResolver, StdFileSystem, StdSleeper,
};
use common::error::Error;
use common::jsonl::{EventLog, PostLog};
use common::llm::{create_providers, BackendsConfig, FallbackChain};
use common::ports::outbound::{
    Clock, EnvResolver, FileSystem, InterruptChecker, Log, LogLevel, LogRecord,
};

use crate::adapter::{DryRunPublisher, FileNotesStore, WebhookPublisher};
use crate::config::PostConfig;
use crate::ports::outbound::Publisher;
use crate::prompts::{decision_instruction, notes_instruction};
use crate::usecase::aggregate::ContextAggregator;
use crate::usecase::decide::PostDecisionEngine;
use crate::usecase::post_loop::{PostLoop, PostLoopSettings};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// 設定解決前から必要なポート
pub struct Base {
    pub env: Arc<dyn EnvResolver>,
    pub fs: Arc<dyn FileSystem>,
    pub clock: Arc<dyn Clock>,
}

pub fn wire_base() -> Base {
    Base {
        env: Arc::new(StdEnvResolver),
        fs: Arc::new(StdFileSystem),
        clock: Arc::new(StdClock),
    }
}

/// logs/post.jsonl と stderr の両方へ出すログ
pub fn wire_log(base: &Base, config: &PostConfig) -> Arc<dyn Log> {
    let file: Arc<dyn Log> = Arc::new(FileJsonLog::new(
        Arc::clone(&base.fs),
        config.log_dir.join("post.jsonl"),
    ));
    let human: Arc<dyn Log> = Arc::new(HumanLog::new());
    Arc::new(FanoutLog::new(vec![file, human]))
}

pub fn wire_aggregator(base: &Base, config: &PostConfig, log: Arc<dyn Log>) -> ContextAggregator {
    ContextAggregator::new(EventLog::new(Arc::clone(&base.fs), &config.event_log), log)
}

fn wire_engine(
    base: &Base,
    config: &PostConfig,
    log: Arc<dyn Log>,
) -> Result<PostDecisionEngine, Error> {
    let channel = config.require_channel()?;
    let backends = BackendsConfig::load(base.fs.as_ref(), config.backends_path.as_deref())?;
    let api_key = backends.resolve_api_key(base.env.as_ref())?;
    let decision_chain = FallbackChain::new(
        "decision",
        create_providers(&backends, &backends.decision_models, &api_key)?,
        Arc::clone(&log),
    );
    let notes_chain = FallbackChain::new(
        "notes",
        create_providers(&backends, &backends.decision_models, &api_key)?,
        Arc::clone(&log),
    );
    log_chain(&log, &decision_chain, "decision");
    log_chain(&log, &notes_chain, "notes");
    Ok(PostDecisionEngine::new(
        decision_chain,
        notes_chain,
        PostLog::new(Arc::clone(&base.fs), &config.post_log),
        Arc::clone(&base.clock),
        log,
        decision_instruction(channel),
        notes_instruction(channel),
    ))
}

/// 起動時に問い合わせ順のモデルを残す
fn log_chain(log: &Arc<dyn Log>, chain: &FallbackChain, label: &str) {
    let models: Vec<String> = chain.model_names().iter().map(|m| m.to_string()).collect();
    let _ = log.log(
        &LogRecord::new(LogLevel::Info, "fallback chain ready")
            .with_layer("wiring")
            .with_kind("lifecycle")
            .with_field("chain", label)
            .with_field("models", models),
    );
}

fn wire_publisher(
    base: &Base,
    config: &PostConfig,
    log: Arc<dyn Log>,
) -> Result<Arc<dyn Publisher>, Error> {
    let publisher: Arc<dyn Publisher> = match config.webhook()? {
        Some(url) => Arc::new(WebhookPublisher::new(
            url,
            WEBHOOK_TIMEOUT,
            Arc::clone(&base.fs),
            log,
        )?),
        None => Arc::new(DryRunPublisher::new(log)),
    };
    Ok(publisher)
}

fn wire_interrupt(log: &Arc<dyn Log>) -> Arc<dyn InterruptChecker> {
    match SigintChecker::new() {
        Ok(checker) => Arc::new(checker),
        Err(e) => {
            let _ = log.log(
                &LogRecord::new(LogLevel::Warn, "signal handler not installed")
                    .with_layer("wiring")
                    .with_field("error", e.to_string()),
            );
            Arc::new(NoopInterruptChecker)
        }
    }
}

pub fn wire_post_loop(
    base: &Base,
    config: &PostConfig,
    log: Arc<dyn Log>,
) -> Result<PostLoop, Error> {
    Ok(PostLoop {
        aggregator: wire_aggregator(base, config, Arc::clone(&log)),
        engine: wire_engine(base, config, Arc::clone(&log))?,
        notes: Arc::new(FileNotesStore::new(Arc::clone(&base.fs), &config.notes_file)),
        publisher: wire_publisher(base, config, Arc::clone(&log))?,
        clock: Arc::clone(&base.clock),
        sleeper: Arc::new(StdSleeper),
        interrupt: wire_interrupt(&log),
        log,
        settings: PostLoopSettings {
            interval: config.interval,
            window: config.window,
            limit: config.limit,
            publish_enabled: config.publish_enabled,
            error_backoff: config.error_backoff,
        },
    })
}
