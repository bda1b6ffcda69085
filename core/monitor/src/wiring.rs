//! 配線: 標準アダプタで Analyzer と MonitorLoop を組み立てる

use std::sync::Arc;

use common::adapter::{
    FanoutLog, FileJsonLog, HumanLog, NoopInterruptChecker, SigintChecker, StdClock,
    StdEnvResolver, StdFileSystem, StdProcess, StdSleeper,
};
use common::error::Error;
use common::jsonl::EventLog;
use common::llm::{create_providers, BackendsConfig, FallbackChain};
use common::ports::outbound::{
    Clock, EnvResolver, FileSystem, InterruptChecker, Log, LogLevel, LogRecord,
};

use crate::adapter::{CommandScreenshotSource, RetentionPruner};
use crate::config::MonitorConfig;
use crate::prompts::analysis_instruction;
use crate::usecase::analyze::Analyzer;
use crate::usecase::monitor_loop::{LoopTiming, MonitorLoop};

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

/// logs/monitor.jsonl と stderr の両方へ出すログ
pub fn wire_log(base: &Base, config: &MonitorConfig) -> Arc<dyn Log> {
    let file: Arc<dyn Log> = Arc::new(FileJsonLog::new(
        Arc::clone(&base.fs),
        config.log_dir.join("monitor.jsonl"),
    ));
    let human: Arc<dyn Log> = Arc::new(HumanLog::new());
    Arc::new(FanoutLog::new(vec![file, human]))
}

/// 解析ルーブリック（--instruction-file があればその内容）
fn system_instruction(base: &Base, config: &MonitorConfig) -> Result<String, Error> {
    match &config.instruction_file {
        Some(path) => base.fs.read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read instruction file {}: {}", path.display(), e))
        }),
        None => Ok(analysis_instruction(&config.channel)),
    }
}

pub fn wire_analyzer(
    base: &Base,
    config: &MonitorConfig,
    log: Arc<dyn Log>,
) -> Result<Analyzer, Error> {
    let backends = BackendsConfig::load(base.fs.as_ref(), config.backends_path.as_deref())?;
    let api_key = backends.resolve_api_key(base.env.as_ref())?;
    let providers = create_providers(&backends, &backends.analysis_models, &api_key)?;
    let chain = FallbackChain::new("analysis", providers, Arc::clone(&log));
    log_chain(&log, &chain, "analysis");
    Ok(Analyzer::new(
        chain,
        Arc::clone(&base.fs),
        Arc::clone(&base.clock),
        log,
        system_instruction(base, config)?,
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

pub fn wire_monitor_loop(
    base: &Base,
    config: &MonitorConfig,
    log: Arc<dyn Log>,
) -> Result<MonitorLoop, Error> {
    let command = config.require_capture_command()?.to_string();
    let analyzer = wire_analyzer(base, config, Arc::clone(&log))?;
    let source = Arc::new(CommandScreenshotSource::new(
        Arc::new(StdProcess),
        Arc::clone(&base.fs),
        Arc::clone(&base.clock),
        command,
        config.channel.clone(),
        &config.images_dir,
    ));
    let pruner = Arc::new(RetentionPruner::new(
        Arc::clone(&base.fs),
        Arc::clone(&log),
        &config.images_dir,
        config.max_images,
    ));
    Ok(MonitorLoop {
        source,
        analyzer,
        event_log: EventLog::new(Arc::clone(&base.fs), &config.event_log),
        pruner,
        sleeper: Arc::new(StdSleeper),
        interrupt: wire_interrupt(&log),
        log,
        timing: LoopTiming {
            interval: config.interval,
            boot_wait: config.boot_wait,
            error_backoff: config.error_backoff,
        },
    })
}
