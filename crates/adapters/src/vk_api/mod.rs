//! VK API adapter for fetching wall pages and subscription lists

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use vk_wall_watch_domain::{
    Attachment, DocAttachment, GroupIdentity, PhotoAttachment, PhotoSize, ProfileIdentity,
    WallClient, WallClientError, WallPage, WallPost,
};

/// Protocol version sent with every call
const API_VERSION: &str = "5.199";

/// VK API wall client
pub struct VkWallClient {
    client: Client,
    access_token: SecretString,
    base_url: String,
}

impl VkWallClient {
    pub fn new(access_token: SecretString) -> Self {
        Self::with_base_url(access_token, "https://api.vk.com/method".to_string())
    }

    pub fn with_base_url(access_token: SecretString, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            access_token,
            base_url,
        }
    }

    /// Call one API method and unwrap the success/error envelope
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, WallClientError> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("v", API_VERSION)])
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| WallClientError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(WallClientError::Auth("Invalid access token".to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WallClientError::Http { status, body });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| WallClientError::InvalidResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(WallClientError::Api {
                code: error.error_code,
                message: error.error_msg,
                request_params: error
                    .request_params
                    .map(|params| serde_json::to_string(&params).unwrap_or_default()),
            });
        }

        envelope.response.ok_or_else(|| {
            WallClientError::InvalidResponse("Missing response payload".to_string())
        })
    }
}

#[async_trait]
impl WallClient for VkWallClient {
    async fn fetch_wall(
        &self,
        owner_id: &str,
        extended: bool,
    ) -> Result<WallPage, WallClientError> {
        tracing::debug!(owner_id = %owner_id, extended = extended, "Calling wall.get");

        let extended = if extended { "1" } else { "0" };
        let response: WallGetResponse = self
            .call("wall.get", &[("owner_id", owner_id), ("extended", extended)])
            .await?;

        Ok(WallPage {
            items: response.items.into_iter().map(WallPost::from).collect(),
            groups: response
                .groups
                .map(|groups| groups.into_iter().map(GroupIdentity::from).collect()),
            profiles: response
                .profiles
                .map(|profiles| profiles.into_iter().map(ProfileIdentity::from).collect()),
        })
    }

    async fn fetch_subscriptions(&self) -> Result<Vec<GroupIdentity>, WallClientError> {
        tracing::debug!("Calling groups.get");

        let response: GroupsGetResponse = self.call("groups.get", &[("extended", "1")]).await?;

        Ok(response
            .items
            .into_iter()
            .map(GroupIdentity::from)
            .collect())
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    response: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error_code: i64,
    error_msg: String,
    request_params: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct WallGetResponse {
    #[serde(default)]
    items: Vec<WireWallItem>,
    groups: Option<Vec<WireGroup>>,
    profiles: Option<Vec<WireProfile>>,
}

#[derive(Deserialize)]
struct GroupsGetResponse {
    #[serde(default)]
    items: Vec<WireGroup>,
}

#[derive(Deserialize)]
struct WireWallItem {
    id: i64,
    owner_id: i64,
    #[serde(default)]
    post_type: String,
    // The API encodes flags as 0/1 integers
    #[serde(default)]
    marked_as_ads: i64,
    #[serde(default)]
    is_pinned: i64,
    #[serde(default)]
    date: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
}

impl From<WireWallItem> for WallPost {
    fn from(item: WireWallItem) -> Self {
        WallPost {
            id: item.id,
            owner_id: item.owner_id,
            post_type: item.post_type,
            is_ad: item.marked_as_ads == 1,
            is_pinned: item.is_pinned == 1,
            date: item.date,
            text: item.text,
            attachments: item
                .attachments
                .into_iter()
                .map(Attachment::from)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct WireAttachment {
    #[serde(rename = "type")]
    kind: String,
    photo: Option<WirePhoto>,
    doc: Option<WireDoc>,
}

impl From<WireAttachment> for Attachment {
    fn from(wire: WireAttachment) -> Self {
        match (wire.kind.as_str(), wire.photo, wire.doc) {
            ("photo", Some(photo), _) => Attachment::Photo(PhotoAttachment {
                owner_id: photo.owner_id,
                id: photo.id,
                sizes: photo.sizes.into_iter().map(PhotoSize::from).collect(),
                orig_photo: photo.orig_photo.map(PhotoSize::from),
            }),
            ("doc", _, Some(doc)) => Attachment::Doc(DocAttachment {
                owner_id: doc.owner_id,
                id: doc.id,
                ext: doc.ext,
                video_src: doc.preview.video.and_then(|video| video.src),
            }),
            ("link", _, _) => Attachment::Link,
            // Tag/payload mismatches fall through to the annotation path
            (_, _, _) => Attachment::Other { kind: wire.kind },
        }
    }
}

#[derive(Deserialize)]
struct WirePhoto {
    owner_id: i64,
    id: i64,
    #[serde(default)]
    sizes: Vec<WireSize>,
    // Not in the API docs, present on newer posts
    orig_photo: Option<WireSize>,
}

#[derive(Deserialize)]
struct WireSize {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default, rename = "type")]
    kind: String,
    url: Option<String>,
}

impl From<WireSize> for PhotoSize {
    fn from(size: WireSize) -> Self {
        PhotoSize {
            width: size.width,
            height: size.height,
            kind: size.kind,
            url: size.url,
        }
    }
}

#[derive(Deserialize)]
struct WireDoc {
    owner_id: i64,
    id: i64,
    #[serde(default)]
    ext: String,
    #[serde(default)]
    preview: WirePreview,
}

#[derive(Deserialize, Default)]
struct WirePreview {
    video: Option<WirePreviewVideo>,
}

#[derive(Deserialize)]
struct WirePreviewVideo {
    src: Option<String>,
}

#[derive(Deserialize)]
struct WireGroup {
    id: i64,
    #[serde(default)]
    name: String,
    screen_name: Option<String>,
}

impl From<WireGroup> for GroupIdentity {
    fn from(group: WireGroup) -> Self {
        GroupIdentity {
            id: group.id,
            name: group.name,
            screen_name: group.screen_name,
        }
    }
}

#[derive(Deserialize)]
struct WireProfile {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    screen_name: Option<String>,
}

impl From<WireProfile> for ProfileIdentity {
    fn from(profile: WireProfile) -> Self {
        ProfileIdentity {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            screen_name: profile.screen_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VkWallClient {
        VkWallClient::with_base_url(SecretString::new("test-token".into()), server.uri())
    }

    #[tokio::test]
    async fn fetch_wall_maps_posts_and_tables() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wall.get"))
            .and(query_param("owner_id", "-123"))
            .and(query_param("extended", "1"))
            .and(query_param("v", "5.199"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {
                    "items": [
                        {
                            "id": 9,
                            "owner_id": -123,
                            "post_type": "post",
                            "marked_as_ads": 0,
                            "is_pinned": 1,
                            "date": 1700000000,
                            "text": "hello",
                            "attachments": [
                                {
                                    "type": "photo",
                                    "photo": {
                                        "owner_id": -123,
                                        "id": 500,
                                        "sizes": [
                                            {"width": 100, "height": 75, "type": "s", "url": "https://example.com/s.jpg"},
                                            {"width": 400, "height": 300, "type": "x", "url": "https://example.com/x.jpg"}
                                        ]
                                    }
                                },
                                {
                                    "type": "doc",
                                    "doc": {
                                        "owner_id": -123,
                                        "id": 77,
                                        "ext": "gif",
                                        "preview": {"video": {"src": "https://example.com/clip.mp4"}}
                                    }
                                },
                                {"type": "audio"}
                            ]
                        }
                    ],
                    "groups": [
                        {"id": 123, "name": "Example", "screen_name": "example_club"}
                    ],
                    "profiles": [
                        {"id": 7, "first_name": "Ada", "last_name": "Lovelace"}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let page = client(&mock_server).fetch_wall("-123", true).await.unwrap();

        assert_eq!(page.items.len(), 1);
        let post = &page.items[0];
        assert_eq!(post.id, 9);
        assert!(!post.is_ad);
        assert!(post.is_pinned);
        assert_eq!(post.attachments.len(), 3);
        assert!(matches!(&post.attachments[0], Attachment::Photo(p) if p.sizes.len() == 2));
        assert!(matches!(&post.attachments[1], Attachment::Doc(d) if d.ext == "gif"
            && d.video_src.as_deref() == Some("https://example.com/clip.mp4")));
        assert!(matches!(&post.attachments[2], Attachment::Other { kind } if kind == "audio"));

        assert_eq!(page.groups.as_ref().unwrap()[0].id, 123);
        assert_eq!(page.profiles.as_ref().unwrap()[0].first_name, "Ada");
    }

    #[tokio::test]
    async fn fetch_wall_surfaces_error_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wall.get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {
                    "error_code": 15,
                    "error_msg": "Access denied: wall is disabled",
                    "request_params": [
                        {"key": "owner_id", "value": "-123"}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .fetch_wall("-123", false)
            .await
            .unwrap_err();

        match err {
            WallClientError::Api {
                code,
                message,
                request_params,
            } => {
                assert_eq!(code, 15);
                assert_eq!(message, "Access denied: wall is disabled");
                assert!(request_params.unwrap().contains("owner_id"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_wall_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wall.get"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .fetch_wall("-123", false)
            .await
            .unwrap_err();

        assert!(matches!(err, WallClientError::Auth(_)));
    }

    #[tokio::test]
    async fn fetch_subscriptions_returns_groups() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/groups.get"))
            .and(query_param("extended", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {
                    "count": 2,
                    "items": [
                        {"id": 55, "name": "First", "screen_name": "first_club"},
                        {"id": 66, "name": "Second"}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let groups = client(&mock_server).fetch_subscriptions().await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].screen_name.as_deref(), Some("first_club"));
        assert!(groups[1].screen_name.is_none());
    }
}
