//! 外部コマンドでスクリーンショットを取る ScreenshotSource 実装
//!
//! `sh -c <command>` を実行し、環境変数 STREAM_CHANNEL と OUTPUT_PATH を渡す。
//! コマンドは OUTPUT_PATH に PNG を書き出して 0 で終了すること。

use crate::ports::outbound::ScreenshotSource;
use common::error::Error;
use common::ports::outbound::{Clock, FileSystem, Process};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct CommandScreenshotSource {
    process: Arc<dyn Process>,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    command: String,
    channel: String,
    images_dir: PathBuf,
}

impl CommandScreenshotSource {
    pub fn new(
        process: Arc<dyn Process>,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        command: impl Into<String>,
        channel: impl Into<String>,
        images_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            process,
            fs,
            clock,
            command: command.into(),
            channel: channel.into(),
            images_dir: images_dir.as_ref().to_path_buf(),
        }
    }

    fn output_path(&self) -> PathBuf {
        let stamp = self.clock.now().format("%Y%m%d_%H%M%S_UTC");
        self.images_dir.join(format!("{}.png", stamp))
    }
}

impl ScreenshotSource for CommandScreenshotSource {
    fn capture(&self) -> Result<PathBuf, Error> {
        self.fs.create_dir_all(&self.images_dir)?;
        let output = self.output_path();
        let envs = [
            ("STREAM_CHANNEL".to_string(), self.channel.clone()),
            ("OUTPUT_PATH".to_string(), output.display().to_string()),
        ];
        let code = self.process.run(
            Path::new("sh"),
            &["-c".to_string(), self.command.clone()],
            &envs,
        )?;
        if code != 0 {
            return Err(Error::io_msg(format!(
                "capture command exited with status {}",
                code
            )));
        }
        if !self.fs.exists(&output) {
            return Err(Error::io_msg(format!(
                "capture command did not write {}",
                output.display()
            )));
        }
        Ok(output)
    }
}
