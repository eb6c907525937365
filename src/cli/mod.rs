use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tubescribe",
    about = "Tubescribe - Collect English transcripts for every video on a YouTube channel",
    version,
    long_about = "Lists a YouTube channel's uploads and fetches a transcript for each video, preferring manual English captions, then auto-generated English captions, then a machine translation of any available track. Results are written to a single text or JSON report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch transcripts for every upload of a channel
    Channel {
        /// Channel name to search for, or a channel id (UC...)
        #[arg(value_name = "NAME_OR_ID")]
        channel: String,

        /// Report file path (defaults to <channel>_transcripts.<ext>)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// YouTube Data API key
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Stop after this many videos
        #[arg(long, value_name = "COUNT")]
        limit: Option<usize>,

        /// Delay between consecutive transcript requests in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
    },

    /// Fetch the transcript of a single video
    Video {
        /// Video id or any YouTube video URL
        #[arg(value_name = "ID_OR_URL")]
        video: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text report
    Text,
    /// JSON report with per-video metadata
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("Unknown output format: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_command() {
        let cli = Cli::try_parse_from([
            "tubescribe",
            "channel",
            "3Blue1Brown",
            "--format",
            "json",
            "--limit",
            "5",
            "--api-key",
            "k",
        ])
        .unwrap();

        match cli.command {
            Commands::Channel { channel, format, limit, api_key, .. } => {
                assert_eq!(channel, "3Blue1Brown");
                assert_eq!(format, Some(OutputFormat::Json));
                assert_eq!(limit, Some(5));
                assert_eq!(api_key.as_deref(), Some("k"));
            }
            _ => panic!("expected channel command"),
        }
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("srt".parse::<OutputFormat>().is_err());
    }
}
