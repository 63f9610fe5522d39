//! Application use cases

pub mod resolve;
pub mod sources;
pub mod sync;

pub use resolve::{NormalizedAttachments, ResolveError, normalize_attachments, resolve_owner};
pub use sources::{ResolvedSources, SourceSelection, resolve_sources};
pub use sync::{SyncConfig, SyncEngine, SyncError, filter_posts};
