//! 標準サブプロセス実行（std::process::Command を委譲）

use crate::error::Error;
use crate::ports::outbound::Process;
use std::path::Path;

/// 標準ライブラリの Command を使う Process 実装
#[derive(Debug, Clone, Default)]
pub struct StdProcess;

impl Process for StdProcess {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<i32, Error> {
        let status = std::process::Command::new(program)
            .args(args)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .map_err(|e| {
                Error::io_msg(format!(
                    "Failed to execute '{}': {}",
                    program.display(),
                    e
                ))
            })?;
        // シグナルで終了した場合は終了コードが無い
        Ok(status.code().unwrap_or(1))
    }
}
