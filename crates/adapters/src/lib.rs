//! vk-wall-watch adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `vk_api`: reqwest-based VK API wall client
//! - `state`: SQLite and in-memory cursor stores
//! - `outbox`: JSONL writer for emitted posts

mod state_memory;
mod state_sqlite;

pub mod outbox;
pub mod vk_api;

/// Re-exports for cursor-store adapters
pub mod state {
    pub use crate::state_memory::InMemoryCursorStore;
    pub use crate::state_sqlite::SqliteCursorStore;
}
