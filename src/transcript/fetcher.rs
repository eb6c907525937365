use serde::{Deserialize, Serialize};

use super::{join_segments, FailureReason, TranscriptResult};
use crate::config::TranscriptConfig;
use crate::youtube::captions::{CaptionSource, CaptionTrack, TrackKind, TrackList};
use crate::ScribeError;

/// One step of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Manually authored track in a preferred language
    Manual,
    /// Auto-generated track in a preferred language
    Generated,
    /// Any translatable track, machine translated to the target language
    Translated,
}

impl Strategy {
    pub const DEFAULT_ORDER: [Strategy; 3] = [Strategy::Manual, Strategy::Generated, Strategy::Translated];

    /// The track this strategy would fetch, if the list has one
    pub fn select(&self, tracks: &TrackList, languages: &[String], target: &str) -> Option<CaptionTrack> {
        match self {
            Strategy::Manual => tracks.find(TrackKind::Manual, languages).cloned(),
            Strategy::Generated => tracks.find(TrackKind::Generated, languages).cloned(),
            Strategy::Translated => {
                if !tracks.offers_translation_to(target) {
                    return None;
                }
                tracks
                    .iter()
                    .find(|t| t.translatable)
                    .map(|t| t.translated(target))
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Manual => write!(f, "manual"),
            Strategy::Generated => write!(f, "generated"),
            Strategy::Translated => write!(f, "translated"),
        }
    }
}

/// Fetches one English transcript per video by walking an ordered list of strategies
pub struct TranscriptFetcher {
    source: Box<dyn CaptionSource>,
    strategies: Vec<Strategy>,
    languages: Vec<String>,
    target: String,
}

impl TranscriptFetcher {
    pub fn new(source: Box<dyn CaptionSource>, config: &TranscriptConfig) -> Self {
        Self {
            source,
            strategies: config.strategies.clone(),
            languages: config.languages.clone(),
            target: config.translate_to.clone(),
        }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Fetch the transcript for `video_id`. Never fails: upstream errors become `Failure`.
    pub async fn fetch(&self, video_id: &str) -> TranscriptResult {
        let tracks = match self.source.list_tracks(video_id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!("Could not list transcripts for {}: {:#}", video_id, e);
                return TranscriptResult::Failure(classify_listing_error(&e));
            }
        };

        if tracks.is_empty() {
            tracing::debug!("No transcripts available for {}", video_id);
            return TranscriptResult::Failure(FailureReason::NotFound);
        }

        let mut upstream_failed = false;
        let mut selected_any = false;

        for strategy in &self.strategies {
            let Some(track) = strategy.select(&tracks, &self.languages, &self.target) else {
                tracing::debug!("No {} transcript for {}", strategy, video_id);
                continue;
            };
            selected_any = true;

            match self.source.fetch_track(&track).await {
                Ok(segments) if !segments.is_empty() => {
                    tracing::debug!(
                        "Using {} transcript ({}) for {}",
                        strategy,
                        track.output_language(),
                        video_id
                    );
                    return TranscriptResult::Success {
                        text: join_segments(&segments),
                        strategy: *strategy,
                        language: track.output_language().to_string(),
                    };
                }
                Ok(_) => {
                    tracing::debug!("{} transcript for {} was empty", strategy, video_id);
                }
                Err(e) => {
                    tracing::warn!("Fetching {} transcript for {} failed: {:#}", strategy, video_id, e);
                    upstream_failed = true;
                }
            }
        }

        // Only report a missing English variant when no step had a track to try
        let reason = if upstream_failed {
            FailureReason::UpstreamError
        } else if selected_any {
            FailureReason::NotFound
        } else {
            FailureReason::NoEnglishVariant
        };
        TranscriptResult::Failure(reason)
    }
}

fn classify_listing_error(error: &anyhow::Error) -> FailureReason {
    match error.downcast_ref::<ScribeError>() {
        Some(ScribeError::VideoUnavailable(_)) => FailureReason::NotFound,
        _ => FailureReason::UpstreamError,
    }
}
