//! Sync engine - orchestrates one polling cycle across all sources

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::{
    model::{GroupIdentity, SourceCursor, SyncedPost, WallPost},
    ports::{Clock, CursorError, CursorStore, WallClient, WallClientError},
    usecases::{
        resolve::{ResolveError, normalize_attachments, resolve_owner},
        sources::{SourceSelection, resolve_sources},
    },
};

/// Default pause after each source's fetch, to respect remote rate limits
pub const DEFAULT_SOURCE_DELAY: Duration = Duration::from_millis(300);

/// Configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How the polled source set is determined
    pub selection: SourceSelection,
    /// Fixed delay between per-source network calls
    pub source_delay: Duration,
}

impl SyncConfig {
    pub fn new(selection: SourceSelection) -> Self {
        Self {
            selection,
            source_delay: DEFAULT_SOURCE_DELAY,
        }
    }
}

/// Errors from a polling cycle. All are fatal: the cycle stops at the
/// first failure, keeping cursor writes already committed for earlier
/// sources.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] WallClientError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Cursor store error: {0}")]
    Cursor(#[from] CursorError),
}

/// Incremental feed sync orchestrator.
///
/// Sources are polled strictly sequentially; each source's cursor is
/// written as soon as its page is processed, not batched at cycle end.
#[derive(Clone)]
pub struct SyncEngine<W, S, Cl>
where
    W: WallClient + ?Sized,
    S: CursorStore + ?Sized,
    Cl: Clock + ?Sized,
{
    wall: Arc<W>,
    cursors: Arc<S>,
    clock: Arc<Cl>,
    config: SyncConfig,
}

impl<W, S, Cl> SyncEngine<W, S, Cl>
where
    W: WallClient + ?Sized,
    S: CursorStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(wall: Arc<W>, cursors: Arc<S>, clock: Arc<Cl>, config: SyncConfig) -> Self {
        Self {
            wall,
            cursors,
            clock,
            config,
        }
    }

    /// Run a single poll cycle and return the emitted batch, newest first
    /// per source, in source order.
    pub async fn poll_once(&self) -> Result<Vec<SyncedPost>, SyncError> {
        let resolved = resolve_sources(&self.config.selection, self.wall.as_ref()).await?;

        tracing::info!(sources = resolved.owner_ids.len(), "Resolved sources");

        let mut batch = Vec::new();
        for owner_id in &resolved.owner_ids {
            let emitted = self
                .poll_source(owner_id, resolved.fallback_groups.as_deref())
                .await?;
            batch.extend(emitted);
        }

        Ok(batch)
    }

    async fn poll_source(
        &self,
        owner_id: &str,
        fallback_groups: Option<&[GroupIdentity]>,
    ) -> Result<Vec<SyncedPost>, SyncError> {
        let cursor = self.cursors.get_cursor(owner_id).await?;
        let last_seen = cursor.as_ref().map(|c| c.last_post_id);

        tracing::info!(source = %owner_id, last_seen = ?last_seen, "Fetching wall");

        // Pages only need to embed their own group table when no full
        // list was fetched upfront.
        let page = self
            .wall
            .fetch_wall(owner_id, fallback_groups.is_none())
            .await?;
        sleep(self.config.source_delay).await;

        let items = filter_posts(page.items);
        let page_groups = page.groups.as_deref();
        let page_profiles = page.profiles.as_deref();

        let mut emitted = Vec::new();
        for post in &items {
            // Cutoff: this post and everything older was already delivered
            if last_seen == Some(post.id) {
                break;
            }

            let normalized = normalize_attachments(post)?;
            let owner = resolve_owner(post, page_groups, page_profiles, fallback_groups)?;
            let link = format!("{}?w=wall{}_{}", owner.link, owner.id, post.id);

            emitted.push(SyncedPost {
                owner,
                date: post.date,
                text: normalized.text,
                attachments: normalized.media,
                id: post.id,
                link,
            });

            // Bootstrap: on a source's first-ever poll only the newest
            // post is emitted, to establish the cursor without flooding
            // historical content.
            if last_seen.is_none() {
                break;
            }
        }

        // The cursor tracks the newest filtered post even when nothing
        // was emitted this cycle.
        if let Some(newest) = items.first() {
            self.cursors
                .set_cursor(&SourceCursor {
                    source: owner_id.to_string(),
                    last_post_id: newest.id,
                    updated_at: self.clock.now(),
                })
                .await?;
        }

        tracing::info!(source = %owner_id, emitted = emitted.len(), "Source processed");

        Ok(emitted)
    }
}

/// Retain regular posts only: not ads, not pinned. Order is preserved
/// (still newest first).
pub fn filter_posts(items: Vec<WallPost>) -> Vec<WallPost> {
    items
        .into_iter()
        .filter(|post| post.post_type == "post" && !post.is_ad && !post.is_pinned)
        .collect()
}
