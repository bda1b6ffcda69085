//! アダプター（Outbound ポートの標準実装とテスト用実装）
//!
//! usecase はポートの trait 経由でのみファイル・時刻・ログ・環境変数に触れる。

pub mod file_json_log;
pub mod human_log;
pub mod memory_log;
pub mod sigint_checker;
pub mod std_clock;
pub mod std_env_resolver;
pub mod std_fs;
pub mod std_process;

pub use file_json_log::FileJsonLog;
pub use human_log::{FanoutLog, HumanLog};
pub use memory_log::MemoryLog;
pub use sigint_checker::{NoopInterruptChecker, SigintChecker};
pub use std_clock::{FixedClock, NoopSleeper, StdClock, StdSleeper};
pub use std_env_resolver::{MapEnvResolver, StdEnvResolver};
pub use std_fs::StdFileSystem;
pub use std_process::StdProcess;
