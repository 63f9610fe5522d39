//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{GroupIdentity, SourceCursor, WallPage};

/// Error type for wall client operations
#[derive(Debug, Error)]
pub enum WallClientError {
    /// The remote returned its error envelope; fatal to the current cycle
    #[error("VK API error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        /// Echoed request parameters, re-serialized as JSON
        request_params: Option<String>,
    },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("HTTP status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for the remote feed API
#[async_trait]
pub trait WallClient: Send + Sync {
    /// Fetch one page of wall items for an owner. `extended` asks the page
    /// to embed its own group/profile lookup tables.
    async fn fetch_wall(&self, owner_id: &str, extended: bool)
    -> Result<WallPage, WallClientError>;

    /// Fetch the account's full subscription list (groups with handles)
    async fn fetch_subscriptions(&self) -> Result<Vec<GroupIdentity>, WallClientError>;
}

/// Error type for cursor store operations
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting per-source sync cursors across cycles
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Get the cursor for a source; `None` means never polled before
    async fn get_cursor(&self, source: &str) -> Result<Option<SourceCursor>, CursorError>;

    /// Persist a source's cursor after its page is fully processed
    async fn set_cursor(&self, cursor: &SourceCursor) -> Result<(), CursorError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
