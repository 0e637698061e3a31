//! Parser for subject summary reports
//!
//! The reports are line-oriented: a `File Name:` line opens a section for
//! one recording, and every `Seizure Start Time:` / `Seizure End Time:`
//! pair that follows defines one episode in that recording. Everything
//! else (channel listings, sampling-rate notes) is ignored.

use crate::error::{EegError, EegResult};
use crate::intervals::SeizureInterval;
use std::fs;
use std::path::Path;

/// Parse a summary report from a file on disk.
pub fn parse_summary(path: &Path) -> EegResult<Vec<SeizureInterval>> {
    let text = fs::read_to_string(path).map_err(|e| EegError::UnreadableSource {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_summary_text(&text)
}

/// Parse summary report text already in memory.
pub fn parse_summary_text(text: &str) -> EegResult<Vec<SeizureInterval>> {
    let mut intervals = Vec::new();
    let mut current_file: Option<String> = None;
    let mut pending_start: Option<u64> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.contains("File Name:") {
            current_file = line.rsplit(':').next().map(|s| s.trim().to_string());
            pending_start = None;
        } else if line.contains("Seizure Start Time:") {
            pending_start = Some(parse_seconds(line)?);
        } else if line.contains("Seizure End Time:") {
            let end = parse_seconds(line)?;
            if let (Some(file), Some(start)) = (current_file.as_ref(), pending_start.take()) {
                intervals.push(SeizureInterval::new(file.clone(), start, end));
            }
        }
    }

    Ok(intervals)
}

fn parse_seconds(line: &str) -> EegResult<u64> {
    let raw = line
        .rsplit(':')
        .next()
        .unwrap_or("")
        .replace("seconds", "");
    raw.trim()
        .parse::<u64>()
        .map_err(|_| EegError::UnreadableSource {
            path: "summary".to_string(),
            reason: format!("unparsable seconds field in line '{}'", line),
        })
}
