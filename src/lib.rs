//! Tubescribe - A Rust CLI tool for collecting transcripts from YouTube channels
//!
//! This library lists a channel's uploads through the YouTube Data API, fetches an
//! English transcript for every video through an ordered fallback chain
//! (manual captions, auto-generated captions, machine translation) and writes
//! the results to a single report.

pub mod cli;
pub mod config;
pub mod output;
pub mod transcript;
pub mod utils;
pub mod youtube;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use transcript::fetcher::{Strategy, TranscriptFetcher};
pub use transcript::{FailureReason, ReportPipeline, ReportRecord, TranscriptResult};
pub use youtube::captions::{CaptionSource, YoutubeCaptions};
pub use youtube::channel::ChannelClient;
pub use youtube::VideoReference;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to tubescribe
#[derive(thiserror::Error, Debug)]
pub enum ScribeError {
    #[error("Video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("YouTube is rate limiting or blocking requests from this IP")]
    TooManyRequests,

    #[error("Unexpected response from YouTube: {0}")]
    InvalidResponse(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("A YouTube Data API key is required (use --api-key, YOUTUBE_API_KEY or the config file)")]
    MissingApiKey,

    #[error("Not a YouTube video id or URL: {0}")]
    InvalidVideo(String),
}
