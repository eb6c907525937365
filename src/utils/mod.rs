use regex::Regex;
use std::path::PathBuf;
use url::Url;

use crate::cli::OutputFormat;

/// Extract a video id from a bare id or any common YouTube URL form
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    let bare_id = Regex::new(r"^[A-Za-z0-9_-]{11}$").ok()?;
    if bare_id.is_match(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" => {
            if url.path() == "/watch" {
                url.query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
            } else {
                let mut segments = url.path_segments()?;
                match (segments.next(), segments.next()) {
                    (Some("embed" | "shorts" | "v" | "live"), Some(id)) => Some(id.to_string()),
                    _ => None,
                }
            }
        }
        _ => None,
    }?;

    bare_id.is_match(&candidate).then_some(candidate)
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, spaces, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Default report path for a channel, e.g. `kurzgesagt_transcripts.txt`
pub fn default_report_path(channel: &str, format: OutputFormat) -> PathBuf {
    let stem = sanitize_filename(channel)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let stem = if stem.is_empty() { "channel".to_string() } else { stem };

    PathBuf::from(format!("{}_transcripts.{}", stem, format.extension()))
}
