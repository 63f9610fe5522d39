//! In-memory cursor store for testing and offline mode

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use vk_wall_watch_domain::{CursorError, CursorStore, SourceCursor};

/// In-memory cursor store implementation
pub struct InMemoryCursorStore {
    cursors: RwLock<HashMap<String, SourceCursor>>,
}

impl InMemoryCursorStore {
    pub fn new() -> Self {
        Self {
            cursors: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCursorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn get_cursor(&self, source: &str) -> Result<Option<SourceCursor>, CursorError> {
        let cursors = self
            .cursors
            .read()
            .map_err(|e| CursorError::Database(e.to_string()))?;
        Ok(cursors.get(source).cloned())
    }

    async fn set_cursor(&self, cursor: &SourceCursor) -> Result<(), CursorError> {
        let mut cursors = self
            .cursors
            .write()
            .map_err(|e| CursorError::Database(e.to_string()))?;
        cursors.insert(cursor.source.clone(), cursor.clone());
        Ok(())
    }
}
