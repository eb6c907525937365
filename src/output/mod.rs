use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcript::ReportRecord;

pub mod formatters;

pub use formatters::*;

/// Save the channel report to file
pub async fn save_report(
    channel: &str,
    records: &[ReportRecord],
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let content = match format {
        OutputFormat::Text => format_as_text(channel, records),
        OutputFormat::Json => format_as_json(channel, records)?,
    };

    write_creating_dirs(path, content)
}

/// Save a single transcript to file
pub async fn save_transcript(text: &str, path: &Path) -> Result<()> {
    write_creating_dirs(path, text)
}

fn write_creating_dirs(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    fs_err::write(path, content)?;
    Ok(())
}

/// Print a single video's outcome to console
pub fn print_to_console(record: &ReportRecord) {
    println!("{}", format_single(record));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{FailureReason, TranscriptResult};
    use crate::youtube::VideoReference;

    #[tokio::test]
    async fn saves_report_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("demo_transcripts.txt");
        let records = vec![ReportRecord {
            video: VideoReference::new("abc", "Intro"),
            result: TranscriptResult::Failure(FailureReason::UpstreamError),
        }];

        save_report("Demo", &records, &path, &OutputFormat::Text).await.unwrap();

        let written = fs_err::read_to_string(&path).unwrap();
        assert!(written.starts_with("Transcripts from Demo\n"));
        assert!(written.contains("REASON: upstream error"));
    }

    #[tokio::test]
    async fn saves_transcript_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("nested").join("abc.txt");

        save_transcript("hello world", &path).await.unwrap();

        assert_eq!(fs_err::read_to_string(&path).unwrap(), "hello world");
    }
}
