//! post の設定（CLI > 環境変数 > 既定値）

use crate::cli::CliArgs;
use common::cycle::ERROR_BACKOFF;
use common::error::Error;
use common::ports::outbound::EnvResolver;
use common::settings;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_POST_INTERVAL_MIN: f64 = 5.0;
pub const DEFAULT_CONTEXT_WINDOW_MIN: f64 = 5.0;
pub const DEFAULT_EVENT_LOG: &str = "context/monitor/context.jsonl";
pub const DEFAULT_POST_LOG: &str = "context/post/posts.jsonl";
pub const DEFAULT_NOTES_FILE: &str = "context/post/notes.txt";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq)]
pub struct PostConfig {
    /// プロンプトに埋め込む。判断を行うときだけ必須。
    pub channel: Option<String>,
    pub interval: Duration,
    pub window: chrono::Duration,
    pub limit: Option<usize>,
    pub error_backoff: Duration,
    pub event_log: PathBuf,
    pub post_log: PathBuf,
    pub notes_file: PathBuf,
    pub publish_enabled: bool,
    pub webhook_url: Option<String>,
    pub dry_run: bool,
    pub backends_path: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl PostConfig {
    pub fn resolve(args: &CliArgs, env: &dyn EnvResolver) -> Result<Self, Error> {
        let window = settings::minutes(
            args.window,
            env,
            "CONTEXT_WINDOW",
            DEFAULT_CONTEXT_WINDOW_MIN,
        )?;
        let window = chrono::Duration::from_std(window)
            .map_err(|_| Error::config("CONTEXT_WINDOW is too large"))?;

        Ok(Self {
            channel: settings::string(args.channel.as_deref(), env, "TWITCH_CHANNEL"),
            interval: settings::minutes(
                args.interval,
                env,
                "POST_INTERVAL",
                DEFAULT_POST_INTERVAL_MIN,
            )?,
            window,
            limit: settings::number(args.limit, env, "CONTEXT_LIMIT")?,
            error_backoff: ERROR_BACKOFF,
            event_log: settings::path(
                args.event_log.as_deref(),
                env,
                "EVENT_LOG",
                DEFAULT_EVENT_LOG,
            ),
            post_log: settings::path(args.post_log.as_deref(), env, "POST_LOG", DEFAULT_POST_LOG),
            notes_file: settings::path(
                args.notes_file.as_deref(),
                env,
                "NOTES_FILE",
                DEFAULT_NOTES_FILE,
            ),
            publish_enabled: settings::flag(args.publish, env, "PUBLISH_ENABLED"),
            webhook_url: settings::string(args.webhook_url.as_deref(), env, "PUBLISH_WEBHOOK_URL"),
            dry_run: args.dry_run,
            backends_path: settings::optional_path(
                args.backends.as_deref(),
                env,
                "BACKENDS_CONFIG",
            ),
            log_dir: settings::path(args.log_dir.as_deref(), env, "LOG_DIR", DEFAULT_LOG_DIR),
        })
    }

    pub fn require_channel(&self) -> Result<&str, Error> {
        self.channel
            .as_deref()
            .ok_or_else(|| Error::config("TWITCH_CHANNEL is required"))
    }

    /// 実際に使う webhook。dry run・投稿無効なら None。
    pub fn webhook(&self) -> Result<Option<&str>, Error> {
        if self.dry_run || !self.publish_enabled {
            return Ok(None);
        }
        self.webhook_url
            .as_deref()
            .map(Some)
            .ok_or_else(|| {
                Error::config(
                    "PUBLISH_WEBHOOK_URL is required when publishing is enabled (or use --dry-run)",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::MapEnvResolver;

    #[test]
    fn test_resolve_defaults() {
        let cfg = PostConfig::resolve(&CliArgs::default(), &MapEnvResolver::new()).unwrap();
        assert_eq!(cfg.interval, Duration::from_secs(300));
        assert_eq!(cfg.window, chrono::Duration::minutes(5));
        assert_eq!(cfg.limit, None);
        assert_eq!(cfg.post_log, PathBuf::from("context/post/posts.jsonl"));
        assert_eq!(cfg.notes_file, PathBuf::from("context/post/notes.txt"));
        assert!(!cfg.publish_enabled);
        assert_eq!(cfg.webhook().unwrap(), None);
        assert_eq!(cfg.require_channel().unwrap_err().exit_code(), 78);
    }

    #[test]
    fn test_publish_enabled_requires_webhook() {
        let env = MapEnvResolver::new().with("PUBLISH_ENABLED", "true");
        let cfg = PostConfig::resolve(&CliArgs::default(), &env).unwrap();
        assert!(cfg.publish_enabled);
        assert!(matches!(cfg.webhook().unwrap_err(), Error::Config(_)));

        let dry = CliArgs {
            dry_run: true,
            ..CliArgs::default()
        };
        assert_eq!(PostConfig::resolve(&dry, &env).unwrap().webhook().unwrap(), None);
    }

    #[test]
    fn test_resolve_from_env() {
        let env = MapEnvResolver::new()
            .with("TWITCH_CHANNEL", "pokeplays")
            .with("CONTEXT_WINDOW", "2")
            .with("CONTEXT_LIMIT", "8")
            .with("PUBLISH_ENABLED", "1")
            .with("PUBLISH_WEBHOOK_URL", "https://hooks.example/post");
        let cfg = PostConfig::resolve(&CliArgs::default(), &env).unwrap();
        assert_eq!(cfg.require_channel().unwrap(), "pokeplays");
        assert_eq!(cfg.window, chrono::Duration::minutes(2));
        assert_eq!(cfg.limit, Some(8));
        assert_eq!(cfg.webhook().unwrap(), Some("https://hooks.example/post"));
    }

    #[test]
    fn test_bad_limit_is_config_error() {
        let env = MapEnvResolver::new().with("CONTEXT_LIMIT", "ten");
        let err = PostConfig::resolve(&CliArgs::default(), &env).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_out_of_range_minutes_are_config_errors() {
        for (name, value) in [
            ("POST_INTERVAL", "1e300"),
            ("CONTEXT_WINDOW", "1e300"),
            ("CONTEXT_WINDOW", "1e15"),
        ] {
            let env = MapEnvResolver::new().with(name, value);
            let err = PostConfig::resolve(&CliArgs::default(), &env).unwrap_err();
            assert_eq!(err.exit_code(), 78, "{}={}", name, value);
        }
    }

    #[test]
    fn test_window_beyond_calendar_is_accepted() {
        // chrono::Duration には収まるが、今から引くと暦の範囲を越える
        let env = MapEnvResolver::new().with("CONTEXT_WINDOW", "2e11");
        let cfg = PostConfig::resolve(&CliArgs::default(), &env).unwrap();
        assert!(cfg.window > chrono::Duration::days(365 * 300_000));
    }
}
