//! Owner identity resolution and attachment normalization

use thiserror::Error;

use crate::model::{
    Attachment, GroupIdentity, MediaKind, MediaRef, PhotoSize, PostOwner, ProfileIdentity,
    WallPost,
};

/// Error type for per-post resolution failures. Fail-closed: a missing
/// lookup entry or photo URL is a typed error, never a fabricated value.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unable to get owner for post {post}: no group table available")]
    NoGroupTable { post: String },
    #[error("Unable to get owner for post {post}: page has no profiles table")]
    NoProfileTable { post: String },
    #[error("Unable to find owner for post {post}")]
    OwnerNotFound { post: String },
    #[error("Failed to find photo size for post id {post}")]
    PhotoSize { post: String },
}

/// Resolve a post's owner to a displayable identity.
///
/// Group-owned posts (negative owner id) look up the page's own groups
/// table first, then the cycle-level fallback list. Profile-owned posts
/// only have the page's profiles table; there is no fallback fetch for
/// profiles.
pub fn resolve_owner(
    post: &WallPost,
    page_groups: Option<&[GroupIdentity]>,
    page_profiles: Option<&[ProfileIdentity]>,
    fallback_groups: Option<&[GroupIdentity]>,
) -> Result<PostOwner, ResolveError> {
    if post.owner_id < 0 {
        let groups = page_groups
            .or(fallback_groups)
            .ok_or_else(|| ResolveError::NoGroupTable {
                post: post.composite_id(),
            })?;

        let group = groups
            .iter()
            .find(|g| g.id == -post.owner_id)
            .ok_or_else(|| ResolveError::OwnerNotFound {
                post: post.composite_id(),
            })?;

        Ok(PostOwner {
            id: post.owner_id,
            name: group.name.clone(),
            link: group.link(),
            group: Some(group.clone()),
            profile: None,
        })
    } else {
        let profiles = page_profiles.ok_or_else(|| ResolveError::NoProfileTable {
            post: post.composite_id(),
        })?;

        let profile = profiles
            .iter()
            .find(|p| p.id == post.owner_id)
            .ok_or_else(|| ResolveError::OwnerNotFound {
                post: post.composite_id(),
            })?;

        Ok(PostOwner {
            id: post.owner_id,
            name: profile.display_name(),
            link: profile.link(),
            group: None,
            profile: Some(profile.clone()),
        })
    }
}

/// Output of attachment normalization for one post
#[derive(Debug, Clone)]
pub struct NormalizedAttachments {
    /// Emitted references, in original attachment order
    pub media: Vec<MediaRef>,
    /// Post body with unsupported-type annotations appended in encounter order
    pub text: String,
}

/// Normalize a post's raw attachment list into typed media references.
///
/// Links are dropped. GIF documents become video references when they carry
/// an embedded video source, otherwise they are unrenderable and dropped.
/// Photos pick the original size when present, else the widest listed size.
/// Everything else is annotated into the post text.
pub fn normalize_attachments(post: &WallPost) -> Result<NormalizedAttachments, ResolveError> {
    let mut media = Vec::new();
    let mut text = post.text.clone();

    for attachment in &post.attachments {
        match attachment {
            Attachment::Link => {}
            Attachment::Doc(doc) if doc.ext == "gif" => {
                if let Some(src) = &doc.video_src {
                    media.push(MediaRef {
                        id: format!("{}_{}", doc.owner_id, doc.id),
                        kind: MediaKind::Video,
                        url: src.clone(),
                    });
                }
            }
            Attachment::Photo(photo) => {
                let size = photo
                    .orig_photo
                    .as_ref()
                    .or_else(|| widest_size(&photo.sizes));

                let url = size
                    .and_then(|s| s.url.as_deref())
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| ResolveError::PhotoSize {
                        post: post.composite_id(),
                    })?;

                media.push(MediaRef {
                    id: format!("{}_{}", photo.owner_id, photo.id),
                    kind: MediaKind::Photo,
                    url: url.to_string(),
                });
            }
            Attachment::Doc(_) => {
                text.push_str("\n\nUnsupported attachment type \"doc\"");
            }
            Attachment::Other { kind } => {
                text.push_str(&format!("\n\nUnsupported attachment type \"{kind}\""));
            }
        }
    }

    Ok(NormalizedAttachments { media, text })
}

/// Max-by-width reduction seeded at width 0; later entries win ties
fn widest_size(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    let mut best: Option<&PhotoSize> = None;
    for size in sizes {
        if best.is_none_or(|b| size.width >= b.width) {
            best = Some(size);
        }
    }
    best
}
