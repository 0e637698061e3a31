//! Seizure interval records extracted from subject summary reports

use serde::{Deserialize, Serialize};

/// One annotated seizure episode in a recording, in whole seconds
/// from the start of that recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizureInterval {
    /// Recording file the episode belongs to, as named in the summary
    pub source_file: String,
    /// Episode start, seconds from recording start
    pub start_s: u64,
    /// Episode end, seconds from recording start
    pub end_s: u64,
}

impl SeizureInterval {
    pub fn new(source_file: impl Into<String>, start_s: u64, end_s: u64) -> Self {
        Self {
            source_file: source_file.into(),
            start_s,
            end_s,
        }
    }

    /// Convert the episode to closed window-index bounds for the given
    /// window duration. Both bounds truncate, matching the labeling rule:
    /// an episode touching any part of a window marks the whole window.
    pub fn window_bounds(&self, window_sec: u64) -> (usize, usize) {
        (
            (self.start_s / window_sec) as usize,
            (self.end_s / window_sec) as usize,
        )
    }

    /// Whether this interval annotates the recording with the given
    /// file stem. Summary reports name files with an extension
    /// (e.g. `chb01_03.edf`); readers may identify themselves by stem.
    pub fn matches_recording(&self, recording_id: &str) -> bool {
        let own_stem = self
            .source_file
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.source_file);
        own_stem == recording_id || self.source_file == recording_id
    }
}
