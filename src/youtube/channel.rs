use anyhow::Context;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{check_status, VideoReference};
use crate::config::YoutubeConfig;
use crate::{Result, ScribeError};

/// YouTube Data API v3 client for enumerating a channel's uploads
pub struct ChannelClient {
    client: Client,
    api_key: String,
    base_url: String,
    page_size: u32,
}

impl ChannelClient {
    pub fn new(config: &YoutubeConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    /// Turn a channel name into a channel id. Ids are passed through untouched.
    pub async fn resolve_channel_id(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if looks_like_channel_id(query) {
            return Ok(query.to_string());
        }

        tracing::info!("Searching for channel: {}", query);

        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet"),
                    ("type", "channel"),
                    ("maxResults", "1"),
                    ("q", query),
                ],
            )
            .await?;

        response
            .items
            .into_iter()
            .find_map(|item| item.id.channel_id)
            .ok_or_else(|| ScribeError::ChannelNotFound(query.to_string()).into())
    }

    /// Id of the playlist holding every public upload of a channel
    pub async fn uploads_playlist(&self, channel_id: &str) -> Result<String> {
        let response: ChannelListResponse = self
            .get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.content_details.related_playlists.uploads)
            .ok_or_else(|| ScribeError::ChannelNotFound(channel_id.to_string()).into())
    }

    /// Every upload of the channel in playlist order, capped at `limit`.
    ///
    /// A failing first page is an error; a failing later page ends the listing early.
    pub async fn list_videos(&self, channel_id: &str, limit: Option<usize>) -> Result<Vec<VideoReference>> {
        let playlist_id = self.uploads_playlist(channel_id).await?;
        tracing::debug!("Uploads playlist for {}: {}", channel_id, playlist_id);

        let page_size = self.page_size.to_string();
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("part", "snippet"),
                ("playlistId", playlist_id.as_str()),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }

            let page: PlaylistItemsResponse = match self.get_json("playlistItems", &params).await {
                Ok(page) => page,
                Err(e) if page_token.is_some() => {
                    tracing::warn!("Stopping video listing after {} videos: {:#}", videos.len(), e);
                    break;
                }
                Err(e) => return Err(e),
            };

            let next_page_token = page.next_page_token.clone();
            videos.extend(page.into_videos());
            tracing::debug!("Listed {} videos so far", videos.len());

            if let Some(limit) = limit {
                if videos.len() >= limit {
                    videos.truncate(limit);
                    break;
                }
            }

            match next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(videos)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            anyhow::bail!("YouTube Data API {} request failed ({}): {}", endpoint, status.as_u16(), message);
        }

        check_status(response)?
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", endpoint))
    }
}

fn looks_like_channel_id(input: &str) -> bool {
    Regex::new(r"^UC[A-Za-z0-9_-]{22}$")
        .map(|re| re.is_match(input))
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    title: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

impl PlaylistItemsResponse {
    fn into_videos(self) -> Vec<VideoReference> {
        self.items
            .into_iter()
            .filter_map(|item| {
                let id = item.snippet.resource_id.video_id?;
                Some(VideoReference::new(id, item.snippet.title))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::test_server::TestServer;
    use serde_json::json;

    const CHANNEL_ID: &str = "UCYO_jab_esuFRV4b17AJtAw";

    fn playlist_page(ids: &[&str], next_page_token: Option<&str>) -> String {
        let items: Vec<_> = ids
            .iter()
            .map(|id| json!({"snippet": {"title": format!("Video {}", id), "resourceId": {"videoId": id}}}))
            .collect();
        json!({"items": items, "nextPageToken": next_page_token}).to_string()
    }

    /// Two pages of uploads; the second one answers with `page_two_status`
    async fn uploads_server(page_two_status: u16) -> TestServer {
        TestServer::start(move |request| match request.path() {
            "/channels" => (
                200,
                json!({"items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UUuploads"}}}]}).to_string(),
            ),
            "/playlistItems" if request.has_query("pageToken=P2") => match page_two_status {
                200 => (200, playlist_page(&["v3", "v4"], None)),
                status => (status, "{}".to_string()),
            },
            "/playlistItems" => (200, playlist_page(&["v1", "v2"], Some("P2"))),
            _ => (404, "{}".to_string()),
        })
        .await
    }

    fn client_for(server: &TestServer) -> ChannelClient {
        let config = YoutubeConfig {
            api_base_url: format!("{}/", server.base_url()),
            page_size: 2,
            ..YoutubeConfig::default()
        };
        ChannelClient::new(&config, "secret").unwrap()
    }

    fn ids(videos: &[VideoReference]) -> Vec<&str> {
        videos.iter().map(|v| v.id.as_str()).collect()
    }

    fn playlist_requests(server: &TestServer) -> usize {
        server
            .requests()
            .iter()
            .filter(|r| r.path() == "/playlistItems")
            .count()
    }

    #[tokio::test]
    async fn list_videos_follows_page_tokens() {
        let server = uploads_server(200).await;

        let videos = client_for(&server).list_videos(CHANNEL_ID, None).await.unwrap();

        assert_eq!(ids(&videos), vec!["v1", "v2", "v3", "v4"]);
        assert_eq!(playlist_requests(&server), 2);
        let first = server
            .requests()
            .into_iter()
            .find(|r| r.path() == "/playlistItems")
            .unwrap();
        assert!(first.has_query("playlistId=UUuploads"));
        assert!(first.has_query("maxResults=2"));
        assert!(first.has_query("key=secret"));
        assert!(!first.has_query("pageToken=P2"));
    }

    #[tokio::test]
    async fn limit_cuts_into_the_second_page() {
        let server = uploads_server(200).await;

        let videos = client_for(&server).list_videos(CHANNEL_ID, Some(3)).await.unwrap();

        assert_eq!(ids(&videos), vec!["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn limit_met_on_the_first_page_stops_paging() {
        let server = uploads_server(200).await;

        let videos = client_for(&server).list_videos(CHANNEL_ID, Some(2)).await.unwrap();

        assert_eq!(ids(&videos), vec!["v1", "v2"]);
        assert_eq!(playlist_requests(&server), 1);
    }

    #[tokio::test]
    async fn failing_later_page_keeps_the_videos_listed_so_far() {
        let server = uploads_server(500).await;

        let videos = client_for(&server).list_videos(CHANNEL_ID, None).await.unwrap();

        assert_eq!(ids(&videos), vec!["v1", "v2"]);
        assert_eq!(playlist_requests(&server), 2);
    }

    #[tokio::test]
    async fn failing_first_page_is_an_error() {
        let server = TestServer::start(|request| match request.path() {
            "/channels" => (
                200,
                json!({"items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UUuploads"}}}]}).to_string(),
            ),
            _ => (500, "{}".to_string()),
        })
        .await;

        let err = client_for(&server).list_videos(CHANNEL_ID, None).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::Http { status: 500, .. })
        ));
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn channel_names_are_resolved_through_search() {
        let server = TestServer::start(|request| match request.path() {
            "/search" if request.has_query("q=3Blue1Brown") => (
                200,
                json!({"items": [{"id": {"kind": "youtube#channel", "channelId": CHANNEL_ID}}]}).to_string(),
            ),
            "/search" => (200, json!({"items": []}).to_string()),
            _ => (404, "{}".to_string()),
        })
        .await;
        let client = client_for(&server);

        assert_eq!(client.resolve_channel_id("3Blue1Brown").await.unwrap(), CHANNEL_ID);

        let err = client.resolve_channel_id("nobody").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn recognises_channel_ids() {
        assert!(looks_like_channel_id("UCYO_jab_esuFRV4b17AJtAw"));
        assert!(!looks_like_channel_id("3Blue1Brown"));
        assert!(!looks_like_channel_id("UCshort"));
    }

    #[tokio::test]
    async fn channel_ids_skip_the_search() {
        let client = ChannelClient::new(&YoutubeConfig::default(), "key").unwrap();
        let id = client.resolve_channel_id(" UCYO_jab_esuFRV4b17AJtAw ").await.unwrap();
        assert_eq!(id, "UCYO_jab_esuFRV4b17AJtAw");
    }

    #[test]
    fn parses_playlist_page() {
        let page: PlaylistItemsResponse = serde_json::from_str(
            r#"{
                "nextPageToken": "CDIQAA",
                "items": [
                    {"snippet": {"title": "But what is a neural network?", "resourceId": {"kind": "youtube#video", "videoId": "aircAruvnKk"}}},
                    {"snippet": {"title": "Deleted video", "resourceId": {"kind": "youtube#video"}}},
                    {"snippet": {"title": "Gradient descent", "resourceId": {"kind": "youtube#video", "videoId": "IHZwWFHWa-w"}}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
        let videos = page.into_videos();
        assert_eq!(
            videos,
            vec![
                VideoReference::new("aircAruvnKk", "But what is a neural network?"),
                VideoReference::new("IHZwWFHWa-w", "Gradient descent"),
            ]
        );
    }

    #[test]
    fn parses_search_and_channel_responses() {
        let search: SearchResponse = serde_json::from_str(
            r#"{"items": [{"id": {"kind": "youtube#channel", "channelId": "UCYO_jab_esuFRV4b17AJtAw"}}]}"#,
        )
        .unwrap();
        assert_eq!(search.items[0].id.channel_id.as_deref(), Some("UCYO_jab_esuFRV4b17AJtAw"));

        let channels: ChannelListResponse = serde_json::from_str(
            r#"{"items": [{"contentDetails": {"relatedPlaylists": {"likes": "", "uploads": "UUYO_jab_esuFRV4b17AJtAw"}}}]}"#,
        )
        .unwrap();
        assert_eq!(
            channels.items[0].content_details.related_playlists.uploads,
            "UUYO_jab_esuFRV4b17AJtAw"
        );

        let empty: SearchResponse = serde_json::from_str(r#"{"pageInfo": {"totalResults": 0}}"#).unwrap();
        assert!(empty.items.is_empty());
    }
}
