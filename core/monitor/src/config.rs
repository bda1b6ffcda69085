//! monitor の設定（CLI > 環境変数 > 既定値）

use crate::cli::CliArgs;
use common::cycle::ERROR_BACKOFF;
use common::error::Error;
use common::ports::outbound::EnvResolver;
use common::settings;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MONITOR_INTERVAL_MIN: f64 = 0.5;
pub const DEFAULT_BOOT_WAIT_MIN: f64 = 0.0;
pub const DEFAULT_IMAGES_DIR: &str = "context/images";
pub const DEFAULT_EVENT_LOG: &str = "context/monitor/context.jsonl";
pub const DEFAULT_MAX_IMAGES: usize = 20;
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub channel: String,
    pub interval: Duration,
    pub boot_wait: Duration,
    pub error_backoff: Duration,
    pub images_dir: PathBuf,
    pub event_log: PathBuf,
    /// ループ実行時のみ必須（--analyze では不要）
    pub capture_command: Option<String>,
    pub max_images: usize,
    pub backends_path: Option<PathBuf>,
    pub instruction_file: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl MonitorConfig {
    pub fn resolve(args: &CliArgs, env: &dyn EnvResolver) -> Result<Self, Error> {
        let channel = settings::string(args.channel.as_deref(), env, "TWITCH_CHANNEL")
            .ok_or_else(|| Error::config("TWITCH_CHANNEL is required"))?;

        Ok(Self {
            channel,
            interval: settings::minutes(
                args.interval,
                env,
                "MONITOR_INTERVAL",
                DEFAULT_MONITOR_INTERVAL_MIN,
            )?,
            boot_wait: settings::minutes(
                args.boot_wait,
                env,
                "AGENT_BOOT_WAIT",
                DEFAULT_BOOT_WAIT_MIN,
            )?,
            error_backoff: ERROR_BACKOFF,
            images_dir: settings::path(
                args.images_dir.as_deref(),
                env,
                "IMAGES_DIR",
                DEFAULT_IMAGES_DIR,
            ),
            event_log: settings::path(
                args.event_log.as_deref(),
                env,
                "EVENT_LOG",
                DEFAULT_EVENT_LOG,
            ),
            capture_command: settings::string(
                args.capture_command.as_deref(),
                env,
                "CAPTURE_COMMAND",
            ),
            max_images: settings::number(args.max_images, env, "MAX_IMAGES")?
                .unwrap_or(DEFAULT_MAX_IMAGES),
            backends_path: settings::optional_path(
                args.backends.as_deref(),
                env,
                "BACKENDS_CONFIG",
            ),
            instruction_file: args.instruction_file.as_deref().map(PathBuf::from),
            log_dir: settings::path(args.log_dir.as_deref(), env, "LOG_DIR", DEFAULT_LOG_DIR),
        })
    }

    /// ループ実行に必要な取得コマンド
    pub fn require_capture_command(&self) -> Result<&str, Error> {
        self.capture_command
            .as_deref()
            .ok_or_else(|| Error::config("CAPTURE_COMMAND is required to run the monitor loop"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::MapEnvResolver;

    #[test]
    fn test_resolve_defaults() {
        let env = MapEnvResolver::new().with("TWITCH_CHANNEL", "pokeplays");
        let cfg = MonitorConfig::resolve(&CliArgs::default(), &env).unwrap();
        assert_eq!(cfg.channel, "pokeplays");
        assert_eq!(cfg.interval, Duration::from_secs(30));
        assert_eq!(cfg.boot_wait, Duration::ZERO);
        assert_eq!(cfg.images_dir, PathBuf::from("context/images"));
        assert_eq!(cfg.event_log, PathBuf::from("context/monitor/context.jsonl"));
        assert_eq!(cfg.max_images, 20);
        assert_eq!(cfg.error_backoff, Duration::from_secs(60));
        assert!(cfg.require_capture_command().is_err());
    }

    #[test]
    fn test_resolve_missing_channel_exits_78() {
        let err = MonitorConfig::resolve(&CliArgs::default(), &MapEnvResolver::new()).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_resolve_non_numeric_interval() {
        let env = MapEnvResolver::new()
            .with("TWITCH_CHANNEL", "c")
            .with("MONITOR_INTERVAL", "soon");
        let err = MonitorConfig::resolve(&CliArgs::default(), &env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cli_wins_over_env() {
        let env = MapEnvResolver::new()
            .with("TWITCH_CHANNEL", "env_channel")
            .with("AGENT_BOOT_WAIT", "2")
            .with("CAPTURE_COMMAND", "from-env");
        let args = CliArgs {
            channel: Some("cli_channel".to_string()),
            boot_wait: Some(1.0),
            ..CliArgs::default()
        };
        let cfg = MonitorConfig::resolve(&args, &env).unwrap();
        assert_eq!(cfg.channel, "cli_channel");
        assert_eq!(cfg.boot_wait, Duration::from_secs(60));
        assert_eq!(cfg.require_capture_command().unwrap(), "from-env");
    }

    #[test]
    fn test_interval_too_large_is_config_error() {
        let env = MapEnvResolver::new()
            .with("TWITCH_CHANNEL", "c")
            .with("MONITOR_INTERVAL", "1e300");
        let err = MonitorConfig::resolve(&CliArgs::default(), &env).unwrap_err();
        assert_eq!(err.exit_code(), 78);
        assert!(err.to_string().contains("MONITOR_INTERVAL"));
    }
}
