use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::transcript::{FailureReason, ReportRecord, TranscriptResult};

const SECTION_RULE_WIDTH: usize = 50;
const RECORD_RULE_WIDTH: usize = 30;

/// Success and failure counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub successful: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_records(records: &[ReportRecord]) -> Self {
        let successful = records.iter().filter(|r| r.result.is_success()).count();
        Self {
            successful,
            failed: records.len() - successful,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    channel: &'a str,
    generated_at: DateTime<Utc>,
    summary: RunSummary,
    records: &'a [ReportRecord],
}

/// Render the plain text report
pub fn format_as_text(channel: &str, records: &[ReportRecord]) -> String {
    let section_rule = "=".repeat(SECTION_RULE_WIDTH);
    let record_rule = "-".repeat(RECORD_RULE_WIDTH);

    let mut out = format!("Transcripts from {}\n{}\n\n", channel, section_rule);

    for record in records {
        out.push_str(&format_record(record, &section_rule, &record_rule));
    }

    out
}

fn format_record(record: &ReportRecord, section_rule: &str, record_rule: &str) -> String {
    let video = &record.video;
    match &record.result {
        TranscriptResult::Success { text, .. } => format!(
            "VIDEO: {}\nURL: {}\n{}\n{}\n\n{}\n\n",
            video.title,
            video.watch_url(),
            record_rule,
            text,
            section_rule
        ),
        TranscriptResult::Failure(reason) => format!(
            "FAILED TO GET TRANSCRIPT: {}\nURL: {}\nREASON: {}\n{}\n\n",
            video.title,
            video.watch_url(),
            reason,
            record_rule
        ),
    }
}

/// Render the JSON report
pub fn format_as_json(channel: &str, records: &[ReportRecord]) -> Result<String> {
    let report = JsonReport {
        channel,
        generated_at: Utc::now(),
        summary: RunSummary::from_records(records),
        records,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Render a single-video outcome for the console
pub fn format_single(record: &ReportRecord) -> String {
    match &record.result {
        TranscriptResult::Success { text, .. } => text.clone(),
        TranscriptResult::Failure(reason) => failure_message(record, *reason),
    }
}

pub fn failure_message(record: &ReportRecord, reason: FailureReason) -> String {
    format!(
        "Could not retrieve transcript for video {} ({})",
        record.video.id, reason
    )
}
