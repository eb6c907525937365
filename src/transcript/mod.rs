use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::youtube::VideoReference;

pub mod fetcher;

use fetcher::{Strategy, TranscriptFetcher};

/// One timed unit of caption text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Join segment texts with single spaces, in order
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why no transcript could be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    NoEnglishVariant,
    UpstreamError,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::NoEnglishVariant => write!(f, "no English variant"),
            FailureReason::UpstreamError => write!(f, "upstream error"),
        }
    }
}

/// Outcome of fetching one video's transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptResult {
    Success {
        text: String,
        strategy: Strategy,
        language: String,
    },
    Failure(FailureReason),
}

impl TranscriptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptResult::Success { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TranscriptResult::Success { text, .. } => Some(text),
            TranscriptResult::Failure(_) => None,
        }
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            TranscriptResult::Success { strategy, .. } => Some(*strategy),
            TranscriptResult::Failure(_) => None,
        }
    }
}

/// A video paired with its transcript outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub video: VideoReference,
    pub result: TranscriptResult,
}

/// Sequential per-video loop with a fixed pause between requests
pub struct ReportPipeline {
    fetcher: TranscriptFetcher,
    delay: Duration,
    show_progress: bool,
}

impl ReportPipeline {
    pub fn new(fetcher: TranscriptFetcher, delay: Duration) -> Self {
        Self {
            fetcher,
            delay,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fetch every video in order. One record per video, whatever the outcome.
    pub async fn run(&self, videos: &[VideoReference]) -> Vec<ReportRecord> {
        let progress = if self.show_progress {
            let bar = ProgressBar::new(videos.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut records = Vec::with_capacity(videos.len());

        for (i, video) in videos.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            progress.set_message(video.title.clone());
            tracing::info!("Processing video {}/{}: {}", i + 1, videos.len(), video.title);

            let result = self.fetcher.fetch(&video.id).await;
            if let TranscriptResult::Failure(reason) = &result {
                tracing::info!("No transcript for {} ({})", video.id, reason);
            }

            records.push(ReportRecord {
                video: video.clone(),
                result,
            });
            progress.inc(1);
        }

        progress.finish_with_message("Done");
        records
    }
}
