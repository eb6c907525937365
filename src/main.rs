use anyhow::Result;
use clap::Parser;
use console::style;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubescribe::cli::{Cli, Commands};
use tubescribe::output::{self, RunSummary};
use tubescribe::transcript::{ReportPipeline, ReportRecord, TranscriptResult};
use tubescribe::{utils, ChannelClient, Config, ScribeError, TranscriptFetcher, VideoReference, YoutubeCaptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "tubescribe=debug" } else { "tubescribe=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Channel {
            channel,
            output,
            format,
            api_key,
            limit,
            delay_ms,
        } => {
            let api_key = api_key
                .or_else(|| config.youtube.api_key.clone())
                .ok_or(ScribeError::MissingApiKey)?;
            let format = match format {
                Some(format) => format,
                None => config.default_output_format()?,
            };
            let output = output.unwrap_or_else(|| utils::default_report_path(&channel, format));
            let delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.request_delay());

            let started = Instant::now();
            tracing::info!("Starting transcript collection for channel: {}", channel);

            let client = ChannelClient::new(&config.youtube, api_key)?;
            let channel_id = client.resolve_channel_id(&channel).await?;
            tracing::info!("Channel ID: {}", channel_id);

            let videos = client.list_videos(&channel_id, limit).await?;
            println!("Found {} videos", videos.len());

            let captions = YoutubeCaptions::new(config.request_timeout())?;
            let fetcher = TranscriptFetcher::new(Box::new(captions), &config.transcripts);
            let pipeline = ReportPipeline::new(fetcher, delay).with_progress(!cli.quiet);

            let records = pipeline.run(&videos).await;
            output::save_report(&channel, &records, &output, &format).await?;

            let summary = RunSummary::from_records(&records);
            println!(
                "\n{} Successfully processed {} videos, {} failed ({}).",
                style("Completed!").green().bold(),
                style(summary.successful).green(),
                style(summary.failed).red(),
                utils::format_duration(started.elapsed().as_secs_f64())
            );
            println!("Results saved to: {}", output.display());
        }
        Commands::Video { video, output } => {
            let id = utils::extract_video_id(&video).ok_or_else(|| ScribeError::InvalidVideo(video.clone()))?;

            let captions = YoutubeCaptions::new(config.request_timeout())?;
            let fetcher = TranscriptFetcher::new(Box::new(captions), &config.transcripts);

            tracing::info!("Fetching transcript for video: {}", id);
            let record = ReportRecord {
                result: fetcher.fetch(&id).await,
                video: VideoReference::new(id, ""),
            };

            match (&record.result, output) {
                (TranscriptResult::Success { text, .. }, Some(path)) => {
                    output::save_transcript(text, &path).await?;
                    println!("Transcript saved to: {}", path.display());
                }
                (TranscriptResult::Success { .. }, None) => {
                    output::print_to_console(&record);
                }
                (TranscriptResult::Failure(reason), _) => {
                    anyhow::bail!(output::failure_message(&record, *reason));
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration file:");
                println!("  {}", Config::config_path()?.display());
                println!("Run with --show to display the current values.");
            }
        }
    }

    Ok(())
}
