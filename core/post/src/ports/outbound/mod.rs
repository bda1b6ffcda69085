//! post 固有の Outbound ポート

pub mod notes_store;
pub mod publisher;

pub use notes_store::NotesStore;
pub use publisher::Publisher;
