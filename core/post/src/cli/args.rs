use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::error::Error;

/// コマンドライン引数（未指定は None。環境変数・既定値との合成は config で行う）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub help: bool,
    pub once: bool,
    /// --show-context: 現在の文脈文字列を表示して終了
    pub show_context: bool,
    /// --dry-run: 投稿せずログに残すだけ
    pub dry_run: bool,
    /// --publish: PUBLISH_ENABLED を上書きして投稿を有効にする
    pub publish: bool,
    pub channel: Option<String>,
    /// 分
    pub interval: Option<f64>,
    /// 分
    pub window: Option<f64>,
    pub limit: Option<usize>,
    pub event_log: Option<String>,
    pub post_log: Option<String>,
    pub notes_file: Option<String>,
    pub webhook_url: Option<String>,
    pub backends: Option<String>,
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Args(CliArgs),
    GenerateCompletion(Shell),
}

fn flag_arg(id: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(id).long(id).help(help).action(ArgAction::SetTrue)
}

fn value_arg(id: &'static str, value_name: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(id)
        .long(id)
        .value_name(value_name)
        .help(help)
        .num_args(1)
}

pub(crate) fn build_clap_command() -> clap::Command {
    clap::Command::new("post")
        .about("Decide from recent stream events whether to publish a commentary")
        .disable_help_flag(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .help("Show this help message")
                .action(ArgAction::SetTrue),
        )
        .arg(flag_arg("once", "Run a single decision cycle and exit"))
        .arg(flag_arg("show-context", "Print the aggregated context for now and exit"))
        .arg(flag_arg("dry-run", "Log approved commentary instead of publishing it"))
        .arg(flag_arg("publish", "Enable publishing (overrides PUBLISH_ENABLED)"))
        .arg(value_arg("channel", "name", "Stream channel (overrides TWITCH_CHANNEL)"))
        .arg(
            value_arg("interval", "minutes", "Minutes between decisions (overrides POST_INTERVAL)")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            value_arg("window", "minutes", "Context window length (overrides CONTEXT_WINDOW)")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            value_arg("limit", "n", "Maximum events in the context (overrides CONTEXT_LIMIT)")
                .value_parser(value_parser!(usize)),
        )
        .arg(value_arg("event-log", "path", "Event log JSONL file (overrides EVENT_LOG)"))
        .arg(value_arg("post-log", "path", "Post log JSONL file (overrides POST_LOG)"))
        .arg(value_arg("notes-file", "path", "Notes file (overrides NOTES_FILE)"))
        .arg(value_arg("webhook-url", "url", "Publishing webhook (overrides PUBLISH_WEBHOOK_URL)"))
        .arg(value_arg("backends", "path", "Backends JSON file (overrides BACKENDS_CONFIG)"))
        .arg(value_arg("log-dir", "dir", "Directory for post.jsonl (overrides LOG_DIR)"))
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
        show_context: matches.get_flag("show-context"),
        dry_run: matches.get_flag("dry-run"),
        publish: matches.get_flag("publish"),
        channel: string("channel"),
        interval: matches.get_one::<f64>("interval").copied(),
        window: matches.get_one::<f64>("window").copied(),
        limit: matches.get_one::<usize>("limit").copied(),
        event_log: string("event-log"),
        post_log: string("post-log"),
        notes_file: string("notes-file"),
        webhook_url: string("webhook-url"),
        backends: string("backends"),
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
    clap_complete::generate(shell, &mut cmd, "post", &mut std::io::stdout());
}
