//! Outbound ポート: アプリが外界（FS・時刻・スリープ・ログ・環境変数・割り込み・子プロセス）を使うための trait

pub mod clock;
pub mod env_resolver;
pub mod fs;
pub mod interrupt_checker;
pub mod log;
pub mod process;

pub use clock::{Clock, Sleeper};
pub use env_resolver::EnvResolver;
pub use fs::{FileMetadata, FileSystem};
pub use interrupt_checker::InterruptChecker;
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
pub use process::Process;
