//! monitor 固有の Outbound ポート

pub mod image_pruner;
pub mod screenshot_source;

pub use image_pruner::ImagePruner;
pub use screenshot_source::ScreenshotSource;
