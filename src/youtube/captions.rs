use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, RequestBuilder};
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::check_status;
use crate::transcript::Segment;
use crate::{Result, ScribeError};

const YOUTUBE_URL: &str = "https://www.youtube.com";
const CONSENT_ACTION: &str = "action=\"https://consent.youtube.com/s\"";
const ANDROID_CLIENT_VERSION: &str = "20.10.38";

/// Who produced a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Uploaded by the owner or a captioner
    Manual,
    /// Automatic speech recognition
    Generated,
}

/// One caption track offered for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub kind: TrackKind,
    pub base_url: String,
    pub translatable: bool,
    /// Target language when this track is fetched as a machine translation
    pub translation: Option<String>,
}

impl CaptionTrack {
    /// Copy of this track that will be fetched translated into `language_code`
    pub fn translated(&self, language_code: &str) -> Self {
        Self {
            translation: Some(language_code.to_string()),
            ..self.clone()
        }
    }

    /// Language of the text this track yields
    pub fn output_language(&self) -> &str {
        self.translation.as_deref().unwrap_or(&self.language_code)
    }

    pub fn fetch_url(&self) -> String {
        match &self.translation {
            Some(lang) => format!("{}&tlang={}", self.base_url, urlencoding::encode(lang)),
            None => self.base_url.clone(),
        }
    }
}

/// Every caption track available for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackList {
    pub video_id: String,
    pub tracks: Vec<CaptionTrack>,
    /// Languages YouTube offers machine translation into
    pub translation_languages: Vec<String>,
}

impl TrackList {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn manual(&self) -> impl Iterator<Item = &CaptionTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Manual)
    }

    pub fn generated(&self) -> impl Iterator<Item = &CaptionTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Generated)
    }

    /// Manual tracks first, then generated ones
    pub fn iter(&self) -> impl Iterator<Item = &CaptionTrack> {
        self.manual().chain(self.generated())
    }

    /// First track of `kind` matching `languages`, honouring the order of `languages`
    pub fn find(&self, kind: TrackKind, languages: &[String]) -> Option<&CaptionTrack> {
        languages.iter().find_map(|lang| {
            self.tracks
                .iter()
                .find(|t| t.kind == kind && t.language_code == *lang)
        })
    }

    /// An empty offer list means YouTube did not say, so translation is still attempted
    pub fn offers_translation_to(&self, language_code: &str) -> bool {
        self.translation_languages.is_empty()
            || self.translation_languages.iter().any(|l| l == language_code)
    }
}

/// Upstream provider of caption tracks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// List every caption track for a video
    async fn list_tracks(&self, video_id: &str) -> Result<TrackList>;

    /// Download a track as ordered segments
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<Segment>>;
}

/// Caption source backed by the public watch page and player endpoint
pub struct YoutubeCaptions {
    client: Client,
    base_url: String,
}

impl YoutubeCaptions {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: YOUTUBE_URL.to_string(),
        }
    }

    /// Serve watch pages and player responses from another origin
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let watch_url = format!("{}/watch", self.base_url);
        let html = self
            .get_text(self.client.get(&watch_url).query(&[("v", video_id)]))
            .await?;

        if !html.contains(CONSENT_ACTION) {
            return Ok(html);
        }

        let token = consent_token(&html).ok_or_else(|| {
            ScribeError::InvalidResponse("consent page without a consent token".to_string())
        })?;
        tracing::debug!("Accepting cookie consent for {}", video_id);

        let html = self
            .get_text(
                self.client
                    .get(&watch_url)
                    .query(&[("v", video_id)])
                    .header(COOKIE, format!("CONSENT=YES+{}", token)),
            )
            .await?;

        if html.contains(CONSENT_ACTION) {
            return Err(ScribeError::InvalidResponse("cookie consent was not accepted".to_string()).into());
        }

        Ok(html)
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": ANDROID_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(format!("{}/youtubei/v1/player", self.base_url))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        check_status(response)?
            .json::<PlayerResponse>()
            .await
            .context("Failed to parse player response")
    }

    async fn get_text(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        Ok(check_status(response)?.text().await?)
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptions {
    async fn list_tracks(&self, video_id: &str) -> Result<TrackList> {
        tracing::debug!("Listing caption tracks for {}", video_id);

        let html = self.fetch_watch_page(video_id).await?;
        let api_key = extract_innertube_api_key(&html)?;
        let player = self.fetch_player(video_id, &api_key).await?;

        track_list_from_player(video_id, player)
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<Segment>> {
        tracing::debug!(
            "Fetching {:?} track {} ({})",
            track.kind,
            track.language_code,
            track.output_language()
        );

        let xml = self.get_text(self.client.get(track.fetch_url())).await?;
        parse_timedtext(&xml)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<PlayerCaptions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCaptions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<RawTrack>,
    #[serde(default)]
    translation_languages: Vec<RawTranslationLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    base_url: String,
    language_code: String,
    name: Option<TextRuns>,
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRuns {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTranslationLanguage {
    language_code: String,
}

impl TextRuns {
    fn into_text(self) -> String {
        self.simple_text
            .unwrap_or_else(|| self.runs.into_iter().map(|r| r.text).collect())
    }
}

fn track_list_from_player(video_id: &str, player: PlayerResponse) -> Result<TrackList> {
    if let Some(status) = player.playability_status {
        let reason = status.reason.unwrap_or_default();
        match status.status.as_str() {
            "OK" => {}
            "ERROR" => {
                let detail = if reason.is_empty() { video_id.to_string() } else { reason };
                return Err(ScribeError::VideoUnavailable(detail).into());
            }
            "LOGIN_REQUIRED" if reason.contains("not a bot") => {
                return Err(ScribeError::TooManyRequests.into());
            }
            other => {
                return Err(ScribeError::InvalidResponse(format!("{}: {}", other, reason)).into());
            }
        }
    }

    let Some(renderer) = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
    else {
        tracing::debug!("Captions are disabled for {}", video_id);
        return Ok(TrackList {
            video_id: video_id.to_string(),
            ..TrackList::default()
        });
    };

    let tracks = renderer
        .caption_tracks
        .into_iter()
        .map(|raw| CaptionTrack {
            kind: if raw.kind.as_deref() == Some("asr") {
                TrackKind::Generated
            } else {
                TrackKind::Manual
            },
            name: raw.name.map(TextRuns::into_text).unwrap_or_default(),
            base_url: raw.base_url.replace("&fmt=srv3", ""),
            language_code: raw.language_code,
            translatable: raw.is_translatable,
            translation: None,
        })
        .collect();

    Ok(TrackList {
        video_id: video_id.to_string(),
        tracks,
        translation_languages: renderer
            .translation_languages
            .into_iter()
            .map(|l| l.language_code)
            .collect(),
    })
}

fn extract_innertube_api_key(html: &str) -> Result<String> {
    let pattern = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#)?;

    if let Some(caps) = pattern.captures(html) {
        return Ok(caps[1].to_string());
    }

    if html.contains("class=\"g-recaptcha\"") {
        return Err(ScribeError::TooManyRequests.into());
    }

    Err(ScribeError::InvalidResponse("watch page has no INNERTUBE_API_KEY".to_string()).into())
}

fn consent_token(html: &str) -> Option<String> {
    let pattern = Regex::new(r#"name="v" value="([^"]*)""#).ok()?;
    pattern.captures(html).map(|caps| caps[1].to_string())
}

/// Parse a timedtext XML document into ordered segments.
///
/// Elements without text are skipped. Caption text is often escaped twice and may
/// carry inline formatting tags, both of which are removed.
pub fn parse_timedtext(xml: &str) -> Result<Vec<Segment>> {
    let element = Regex::new(r#"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)"#)?;
    let attribute = Regex::new(r#"\b(start|dur)="([^"]*)""#)?;
    let formatting = Regex::new(r#"</?[A-Za-z][A-Za-z0-9]*(?:\s+[A-Za-z-]+="[^"]*")*\s*/?>"#)?;

    let segments = element
        .captures_iter(xml)
        .filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            let text = caption_text(body, &formatting);
            let text = text.trim();
            if text.is_empty() {
                return None;
            }

            let mut start = 0.0;
            let mut duration = 0.0;
            for attr in attribute.captures_iter(&caps[1]) {
                let value = attr[2].parse::<f64>().unwrap_or(0.0);
                match &attr[1] {
                    "start" => start = value,
                    _ => duration = value,
                }
            }

            Some(Segment {
                text: text.to_string(),
                start,
                duration,
            })
        })
        .collect();

    Ok(segments)
}

/// Undo both escaping layers, then drop complete formatting tags.
/// A `<` that does not open a well-formed tag is kept as text.
fn caption_text(body: &str, formatting: &Regex) -> String {
    let once = decode_entities(body);
    let twice = decode_entities(&once.replace('<', "&lt;"));
    formatting.replace_all(&twice, "").into_owned()
}

fn decode_entities(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect()
}
