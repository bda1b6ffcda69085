//! アダプター（post 固有の Outbound ポート実装）

pub mod dry_run_publisher;
pub mod notes_store;
pub mod webhook_publisher;

pub use dry_run_publisher::DryRunPublisher;
pub use notes_store::FileNotesStore;
pub use webhook_publisher::WebhookPublisher;
