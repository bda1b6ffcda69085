//! アダプター（monitor 固有の Outbound ポート実装）

pub mod command_capture;
pub mod image_retention;

pub use command_capture::CommandScreenshotSource;
pub use image_retention::RetentionPruner;
