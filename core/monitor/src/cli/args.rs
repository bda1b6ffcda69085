use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::error::Error;
use std::path::PathBuf;

/// コマンドライン引数（未指定は None。環境変数・既定値との合成は config で行う）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub help: bool,
    /// --once: 1 サイクルだけ実行して終了
    pub once: bool,
    /// --analyze <image>: 1 枚だけ解析して Event JSON を表示
    pub analyze: Option<PathBuf>,
    pub channel: Option<String>,
    /// 分
    pub interval: Option<f64>,
    /// 分
    pub boot_wait: Option<f64>,
    pub images_dir: Option<String>,
    pub event_log: Option<String>,
    pub capture_command: Option<String>,
    pub max_images: Option<usize>,
    pub backends: Option<String>,
    pub instruction_file: Option<String>,
    pub log_dir: Option<String>,
}

/// 解析結果: 通常の引数 / 補完スクリプト生成
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Args(CliArgs),
    GenerateCompletion(Shell),
}

fn value_arg(id: &'static str, value_name: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(id)
        .long(id)
        .value_name(value_name)
        .help(help)
        .num_args(1)
}

pub(crate) fn build_clap_command() -> clap::Command {
    clap::Command::new("monitor")
        .about("Capture stream screenshots and analyze them into events")
        .disable_help_flag(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .help("Show this help message")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("once")
                .long("once")
                .help("Run a single capture cycle and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            value_arg("analyze", "image", "Analyze one image, print the event JSON and exit")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(value_arg("channel", "name", "Stream channel (overrides TWITCH_CHANNEL)"))
        .arg(
            value_arg(
                "interval",
                "minutes",
                "Minutes between captures (overrides MONITOR_INTERVAL)",
            )
            .value_parser(value_parser!(f64)),
        )
        .arg(
            value_arg(
                "boot-wait",
                "minutes",
                "Minutes to wait before the first capture (overrides AGENT_BOOT_WAIT)",
            )
            .value_parser(value_parser!(f64)),
        )
        .arg(value_arg("images-dir", "dir", "Screenshot directory (overrides IMAGES_DIR)"))
        .arg(value_arg("event-log", "path", "Event log JSONL file (overrides EVENT_LOG)"))
        .arg(value_arg(
            "capture-command",
            "cmd",
            "Shell command that writes a PNG to $OUTPUT_PATH (overrides CAPTURE_COMMAND)",
        ))
        .arg(
            value_arg("max-images", "n", "Screenshots kept by cleanup (overrides MAX_IMAGES)")
                .value_parser(value_parser!(usize)),
        )
        .arg(value_arg("backends", "path", "Backends JSON file (overrides BACKENDS_CONFIG)"))
        .arg(value_arg(
            "instruction-file",
            "path",
            "Replace the built-in analysis instruction with this file",
        ))
        .arg(value_arg("log-dir", "dir", "Directory for monitor.jsonl (overrides LOG_DIR)"))
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell))
                .num_args(1),
        )
}

fn matches_to_args(matches: &clap::ArgMatches) -> CliArgs {
    let string = |id: &str| matches.get_one::<String>(id).cloned();
    CliArgs {
        help: matches.get_flag("help"),
        once: matches.get_flag("once"),
        analyze: matches.get_one::<PathBuf>("analyze").cloned(),
        channel: string("channel"),
        interval: matches.get_one::<f64>("interval").copied(),
        boot_wait: matches.get_one::<f64>("boot-wait").copied(),
        images_dir: string("images-dir"),
        event_log: string("event-log"),
        capture_command: string("capture-command"),
        max_images: matches.get_one::<usize>("max-images").copied(),
        backends: string("backends"),
        instruction_file: string("instruction-file"),
        log_dir: string("log-dir"),
    }
}

/// コマンドラインを解析する。補完生成が要求された場合は ParseOutcome::GenerateCompletion を返す。
pub fn parse_args() -> Result<ParseOutcome, Error> {
    parse_from(std::env::args_os())
}

pub(crate) fn parse_from<I, T>(args: I) -> Result<ParseOutcome, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_clap_command()
        .try_get_matches_from(args)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;

    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }
    Ok(ParseOutcome::Args(matches_to_args(&matches)))
}

/// 補完スクリプトを標準出力に出力する。
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "monitor", &mut std::io::stdout());
}
