//! 投稿せずログに残すだけの Publisher

use crate::ports::outbound::Publisher;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use std::path::Path;
use std::sync::Arc;

pub struct DryRunPublisher {
    log: Arc<dyn Log>,
}

impl DryRunPublisher {
    pub fn new(log: Arc<dyn Log>) -> Self {
        Self { log }
    }
}

impl Publisher for DryRunPublisher {
    fn publish(&self, text: &str, image: Option<&Path>) -> bool {
        let mut record = LogRecord::new(LogLevel::Info, "dry run: would publish")
            .with_layer("adapter")
            .with_kind("publish")
            .with_field("text", text);
        if let Some(path) = image {
            record = record.with_field("image", path.display().to_string());
        }
        let _ = self.log.log(&record);
        true
    }
}
