//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One size variant of a photo attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
    /// Single-letter size class as reported by the API (e.g. "s", "x", "w")
    pub kind: String,
    /// Download URL; the API omits it for some legacy variants
    pub url: Option<String>,
}

/// A photo attachment with its size variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub owner_id: i64,
    pub id: i64,
    pub sizes: Vec<PhotoSize>,
    /// Uncropped original, present on newer posts only
    pub orig_photo: Option<PhotoSize>,
}

/// A document attachment (the engine only renders animated GIFs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocAttachment {
    pub owner_id: i64,
    pub id: i64,
    /// File extension tag, e.g. "gif"
    pub ext: String,
    /// Embedded video preview source, when the API transcoded the GIF
    pub video_src: Option<String>,
}

/// A raw wall attachment, one variant per API tag
#[derive(Debug, Clone)]
pub enum Attachment {
    Photo(PhotoAttachment),
    Doc(DocAttachment),
    Link,
    /// Anything the engine does not render; carries the raw tag string
    Other { kind: String },
}

/// A raw post as returned by the wall endpoint, newest first in fetch order
#[derive(Debug, Clone)]
pub struct WallPost {
    /// Unique within the owner's wall
    pub id: i64,
    /// Negative = group/page, positive = personal profile
    pub owner_id: i64,
    /// Classification tag; only "post" survives filtering
    pub post_type: String,
    pub is_ad: bool,
    pub is_pinned: bool,
    /// Publish time, Unix seconds
    pub date: i64,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl WallPost {
    /// Composite identifier used in error messages and permalinks
    pub fn composite_id(&self) -> String {
        format!("{}_{}", self.owner_id, self.id)
    }
}

/// Result of one wall fetch for one source, with optional identity tables
/// valid only for this page's posts
#[derive(Debug, Clone, Default)]
pub struct WallPage {
    pub items: Vec<WallPost>,
    pub groups: Option<Vec<GroupIdentity>>,
    pub profiles: Option<Vec<ProfileIdentity>>,
}

/// A group/page identity copied from API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupIdentity {
    /// Always positive; the owning wall uses the negated value
    pub id: i64,
    pub name: String,
    pub screen_name: Option<String>,
}

impl GroupIdentity {
    pub fn link(&self) -> String {
        match self.screen_name.as_deref().filter(|s| !s.is_empty()) {
            Some(handle) => format!("https://vk.com/{handle}"),
            None => format!("https://vk.com/public{}", self.id),
        }
    }
}

/// A personal-profile identity copied from API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileIdentity {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub screen_name: Option<String>,
}

impl ProfileIdentity {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn link(&self) -> String {
        match self.screen_name.as_deref().filter(|s| !s.is_empty()) {
            Some(handle) => format!("https://vk.com/{handle}"),
            None => format!("https://vk.com/id{}", self.id),
        }
    }
}

/// Resolved display identity of a post's owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostOwner {
    pub id: i64,
    pub name: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileIdentity>,
}

/// Kind of an emitted media reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

/// A normalized media reference: stable id plus a resolvable URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    /// `{owner_id}_{attachment_id}`
    pub id: String,
    pub kind: MediaKind,
    pub url: String,
}

/// The engine's output unit, handed to the downstream consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedPost {
    pub owner: PostOwner,
    /// Publish time, Unix seconds
    pub date: i64,
    /// Post body plus any unsupported-attachment annotations
    pub text: String,
    pub attachments: Vec<MediaRef>,
    pub id: i64,
    /// `{owner.link}?w=wall{owner_id}_{post_id}`
    pub link: String,
}

/// Per-source sync cursor: the last-delivered post identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCursor {
    /// Source identifier as configured (signed owner id string)
    pub source: String,
    pub last_post_id: i64,
    /// When last updated
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_link_prefers_screen_name() {
        let group = GroupIdentity {
            id: 42,
            name: "Example".to_string(),
            screen_name: Some("example_club".to_string()),
        };
        assert_eq!(group.link(), "https://vk.com/example_club");
    }

    #[test]
    fn group_link_falls_back_to_public_id() {
        let group = GroupIdentity {
            id: 42,
            name: "Example".to_string(),
            screen_name: None,
        };
        assert_eq!(group.link(), "https://vk.com/public42");

        let empty_handle = GroupIdentity {
            id: 42,
            name: "Example".to_string(),
            screen_name: Some(String::new()),
        };
        assert_eq!(empty_handle.link(), "https://vk.com/public42");
    }

    #[test]
    fn profile_link_and_name() {
        let profile = ProfileIdentity {
            id: 7,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            screen_name: None,
        };
        assert_eq!(profile.display_name(), "Ada Lovelace");
        assert_eq!(profile.link(), "https://vk.com/id7");
    }

    #[test]
    fn synced_post_serializes_without_empty_identity() {
        let post = SyncedPost {
            owner: PostOwner {
                id: -42,
                name: "Example".to_string(),
                link: "https://vk.com/public42".to_string(),
                group: Some(GroupIdentity {
                    id: 42,
                    name: "Example".to_string(),
                    screen_name: None,
                }),
                profile: None,
            },
            date: 1_700_000_000,
            text: "hello".to_string(),
            attachments: vec![MediaRef {
                id: "-42_9".to_string(),
                kind: MediaKind::Photo,
                url: "https://example.com/p.jpg".to_string(),
            }],
            id: 9,
            link: "https://vk.com/public42?w=wall-42_9".to_string(),
        };

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["owner"]["id"], -42);
        assert!(value["owner"].get("profile").is_none());
        assert_eq!(value["attachments"][0]["kind"], "photo");
        assert_eq!(value["link"], "https://vk.com/public42?w=wall-42_9");
    }
}
