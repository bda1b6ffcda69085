//! 設定値の解決: CLI 指定 > 環境変数 > 既定値
//!
//! 数値として読めない値は Config エラー（ループに入る前に終了させる）。

use crate::error::Error;
use crate::ports::outbound::EnvResolver;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 文字列設定
pub fn string(cli: Option<&str>, env: &dyn EnvResolver, name: &str) -> Option<String> {
    cli.map(|s| s.to_string()).or_else(|| env.var(name))
}

/// パス設定
pub fn path(cli: Option<&str>, env: &dyn EnvResolver, name: &str, default: &str) -> PathBuf {
    PathBuf::from(string(cli, env, name).unwrap_or_else(|| default.to_string()))
}

/// 任意のパス設定（既定なし）
pub fn optional_path(cli: Option<&str>, env: &dyn EnvResolver, name: &str) -> Option<PathBuf> {
    string(cli, env, name).map(PathBuf::from)
}

/// 数値設定。CLI の値は clap で型付け済みなので、環境変数だけを parse する。
pub fn number<T: FromStr>(
    cli: Option<T>,
    env: &dyn EnvResolver,
    name: &str,
) -> Result<Option<T>, Error> {
    if cli.is_some() {
        return Ok(cli);
    }
    match env.var(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(format!("{} must be numeric, got '{}'", name, raw))),
    }
}

/// 分単位の設定（小数可）。負・非有限・Duration に収まらない値は Config エラー。
pub fn minutes(
    cli: Option<f64>,
    env: &dyn EnvResolver,
    name: &str,
    default: f64,
) -> Result<Duration, Error> {
    let m = number(cli, env, name)?.unwrap_or(default);
    if !m.is_finite() || m < 0.0 {
        return Err(Error::config(format!(
            "{} must be a non-negative number of minutes",
            name
        )));
    }
    Duration::try_from_secs_f64(m * 60.0)
        .map_err(|_| Error::config(format!("{} is too large: {} minutes", name, m)))
}

/// 真偽値設定（1/true/yes/on を真とする）
pub fn flag(cli: bool, env: &dyn EnvResolver, name: &str) -> bool {
    cli || env
        .var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MapEnvResolver;

    #[test]
    fn test_cli_overrides_env() {
        let env = MapEnvResolver::new().with("TWITCH_CHANNEL", "from_env");
        assert_eq!(string(Some("cli"), &env, "TWITCH_CHANNEL").as_deref(), Some("cli"));
        assert_eq!(string(None, &env, "TWITCH_CHANNEL").as_deref(), Some("from_env"));
        assert_eq!(string(None, &env, "OTHER"), None);
    }

    #[test]
    fn test_path_default() {
        let env = MapEnvResolver::new();
        assert_eq!(
            path(None, &env, "IMAGES_DIR", "context/images"),
            PathBuf::from("context/images")
        );
    }

    #[test]
    fn test_number_parse_error_is_config() {
        let env = MapEnvResolver::new().with("MAX_IMAGES", "lots");
        let err = number::<usize>(None, &env, "MAX_IMAGES").unwrap_err();
        assert_eq!(err.exit_code(), 78);
        assert_eq!(number::<usize>(Some(3), &env, "MAX_IMAGES").unwrap(), Some(3));
    }

    #[test]
    fn test_minutes() {
        let env = MapEnvResolver::new().with("MONITOR_INTERVAL", "0.25").with("BAD", "-1");
        assert_eq!(
            minutes(None, &env, "MONITOR_INTERVAL", 0.5).unwrap(),
            Duration::from_secs(15)
        );
        assert_eq!(minutes(None, &env, "AGENT_BOOT_WAIT", 0.0).unwrap(), Duration::ZERO);
        assert_eq!(
            minutes(Some(5.0), &env, "POST_INTERVAL", 1.0).unwrap(),
            Duration::from_secs(300)
        );
        assert!(minutes(None, &env, "BAD", 1.0).is_err());
    }

    #[test]
    fn test_minutes_out_of_range_is_config_error() {
        let env = MapEnvResolver::new()
            .with("HUGE", "1e300")
            .with("INF", "inf")
            .with("NAN", "NaN");
        for name in ["HUGE", "INF", "NAN"] {
            let err = minutes(None, &env, name, 1.0).unwrap_err();
            assert_eq!(err.exit_code(), 78, "{}", name);
        }
        assert!(minutes(Some(f64::MAX), &env, "POST_INTERVAL", 1.0).is_err());
    }

    #[test]
    fn test_flag() {
        let env = MapEnvResolver::new().with("A", "true").with("B", "0");
        assert!(flag(false, &env, "A"));
        assert!(!flag(false, &env, "B"));
        assert!(flag(true, &env, "B"));
    }
}
