//! Slice persistence and per-subject dataset assembly
//!
//! The windowing engine's batches are persisted as paired `.npy` slices
//! (`X_` windows, `y_` labels). The assembler later walks those pairs,
//! extracts one feature vector per window, and stacks everything into the
//! subject's final feature and label arrays. A failure in one slice or
//! window is logged and skipped, never fatal to the subject.

use crate::config::PipelineConfig;
use crate::features::FeatureExtractor;
use crate::npy::NpyArray;
use eegprep_core::{EegError, EegResult, WindowBatch};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Slice key shared by a window array and its label companion:
/// `{recording_base}_slice{first}-{last}` with inclusive window indices.
pub fn slice_key(recording_id: &str, window_start: usize, window_stop: usize) -> String {
    format!(
        "{}_slice{}-{}",
        recording_id,
        window_start,
        window_stop.saturating_sub(1)
    )
}

/// Persist one chunk's windows and labels under `{out_dir}/{subject}/`.
pub fn save_batch(out_dir: &Path, subject: &str, batch: &WindowBatch) -> EegResult<()> {
    let key = slice_key(&batch.recording_id, batch.window_start, batch.window_stop);
    let subject_dir = out_dir.join(subject);

    let windows = NpyArray::f32(
        vec![
            batch.window_count(),
            batch.channels,
            batch.samples_per_window,
        ],
        batch.data.clone(),
    )?;
    windows.write(&subject_dir.join(format!("X_{}.npy", key)))?;

    let labels = NpyArray::i8(vec![batch.window_count()], batch.labels.clone())?;
    labels.write(&subject_dir.join(format!("y_{}.npy", key)))?;
    Ok(())
}

/// Per-slice report for inspection output.
#[derive(Debug, Clone)]
pub struct SliceReport {
    pub key: String,
    pub x_shape: Vec<usize>,
    pub n_labels: usize,
    pub positives: usize,
}

/// Shape summary of one assembled subject dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectSummary {
    pub windows: usize,
    pub feature_len: usize,
    pub positives: usize,
}

/// Assembles per-subject feature datasets from persisted slices.
pub struct DatasetAssembler {
    config: PipelineConfig,
    extractor: FeatureExtractor,
}

impl DatasetAssembler {
    pub fn new(config: PipelineConfig) -> EegResult<Self> {
        config.validate()?;
        let extractor = FeatureExtractor::new(&config);
        Ok(Self { config, extractor })
    }

    /// Walk `{slices_dir}/{subject}`, extract features from every paired
    /// slice, and write `X_features_{subject}.npy` / `y_labels_{subject}.npy`
    /// under `{features_dir}/{subject}`. Returns `None` when no usable
    /// windows were found.
    pub fn assemble_subject(
        &mut self,
        slices_dir: &Path,
        subject: &str,
        features_dir: &Path,
    ) -> EegResult<Option<SubjectSummary>> {
        let subject_dir = slices_dir.join(subject);
        let pairs = paired_slices(&subject_dir)?;
        if pairs.is_empty() {
            warn!(subject, "no slice pairs found");
            return Ok(None);
        }

        let expected_len = self.config.feature_len();
        let mut feature_rows: Vec<f32> = Vec::new();
        let mut labels: Vec<i8> = Vec::new();

        for (key, pair) in &pairs {
            let (x_path, y_path) = match pair {
                SlicePair::Complete { x, y } => (x, y),
                SlicePair::MissingX | SlicePair::MissingY => {
                    warn!(subject, key = key.as_str(), "missing companion array, skipping pair");
                    continue;
                }
            };

            match self.extract_slice(x_path, y_path, expected_len) {
                Ok((rows, slice_labels)) => {
                    feature_rows.extend(rows);
                    labels.extend(slice_labels);
                }
                Err(e) => {
                    warn!(subject, key = key.as_str(), error = %e, "skipping slice");
                }
            }
        }

        if labels.is_empty() {
            warn!(subject, "no features extracted");
            return Ok(None);
        }

        let n_windows = labels.len();
        let subject_out = features_dir.join(subject);
        NpyArray::f32(vec![n_windows, expected_len], feature_rows)?
            .write(&subject_out.join(format!("X_features_{}.npy", subject)))?;
        NpyArray::i8(vec![n_windows], labels.clone())?
            .write(&subject_out.join(format!("y_labels_{}.npy", subject)))?;

        let positives = labels.iter().filter(|&&l| l == 1).count();
        info!(subject, windows = n_windows, positives, "subject assembled");
        Ok(Some(SubjectSummary {
            windows: n_windows,
            feature_len: expected_len,
            positives,
        }))
    }

    /// Extract features for every window of one slice pair. Windows whose
    /// vector deviates from the expected length are dropped, not repaired.
    fn extract_slice(
        &mut self,
        x_path: &Path,
        y_path: &Path,
        expected_len: usize,
    ) -> EegResult<(Vec<f32>, Vec<i8>)> {
        let x = NpyArray::read(x_path)?;
        let y = NpyArray::read(y_path)?;

        if x.ndim() != 3 {
            return Err(EegError::ShapeMismatch {
                reason: format!("window array has {} dims, expected 3", x.ndim()),
            });
        }
        let (n_windows, channels, samples) = (x.shape[0], x.shape[1], x.shape[2]);
        let x_data = x.as_f32().ok_or_else(|| EegError::ShapeMismatch {
            reason: "window array is not f32".to_string(),
        })?;
        let y_data = y.as_i8().ok_or_else(|| EegError::ShapeMismatch {
            reason: "label array is not i8".to_string(),
        })?;
        if y.ndim() != 1 || y_data.len() != n_windows {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "label array shape {:?} doesn't match {} windows",
                    y.shape, n_windows
                ),
            });
        }

        let window_len = channels * samples;
        let mut rows = Vec::with_capacity(n_windows * expected_len);
        let mut labels = Vec::with_capacity(n_windows);
        for w in 0..n_windows {
            let window = &x_data[w * window_len..(w + 1) * window_len];
            let features = self.extractor.extract(window, channels, samples)?;
            if features.len() != expected_len {
                warn!(
                    window = w,
                    expected = expected_len,
                    actual = features.len(),
                    "dropping window with unexpected feature length"
                );
                continue;
            }
            rows.extend(features);
            labels.push(y_data[w]);
        }
        Ok((rows, labels))
    }
}

/// State of one slice key's file pair.
enum SlicePair {
    Complete { x: PathBuf, y: PathBuf },
    MissingX,
    MissingY,
}

/// Numeric ordering for a slice key: recording base, then the first
/// window index parsed from the `_slice{first}-{last}` suffix. Raw string
/// order would put `slice12-17` before `slice6-11`.
fn slice_order(key: &str) -> (&str, usize) {
    if let Some((base, range)) = key.rsplit_once("_slice") {
        let first = range.split_once('-').map(|(f, _)| f).unwrap_or(range);
        if let Ok(start) = first.parse::<usize>() {
            return (base, start);
        }
    }
    (key, 0)
}

/// Pair `X_*.npy` and `y_*.npy` files in a subject directory by key,
/// ordered by recording and numeric window start so assembled arrays
/// preserve window order.
fn paired_slices(subject_dir: &Path) -> EegResult<Vec<(String, SlicePair)>> {
    let mut pairs: BTreeMap<String, SlicePair> = BTreeMap::new();
    if !subject_dir.is_dir() {
        return Ok(Vec::new());
    }

    for entry in fs::read_dir(subject_dir)? {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) if n.ends_with(".npy") => n,
            _ => continue,
        };
        let stem = &name[..name.len() - 4];
        if let Some(key) = stem.strip_prefix("X_") {
            pairs
                .entry(key.to_string())
                .and_modify(|p| {
                    if let SlicePair::MissingX = p {
                        *p = SlicePair::Complete {
                            x: path.clone(),
                            y: subject_dir.join(format!("y_{}.npy", key)),
                        };
                    }
                })
                .or_insert(SlicePair::MissingY);
        } else if let Some(key) = stem.strip_prefix("y_") {
            pairs
                .entry(key.to_string())
                .and_modify(|p| {
                    if let SlicePair::MissingY = p {
                        *p = SlicePair::Complete {
                            x: subject_dir.join(format!("X_{}.npy", key)),
                            y: path.clone(),
                        };
                    }
                })
                .or_insert(SlicePair::MissingX);
        }
    }

    let mut ordered: Vec<(String, SlicePair)> = pairs.into_iter().collect();
    ordered.sort_by(|(a, _), (b, _)| {
        let (base_a, start_a) = slice_order(a);
        let (base_b, start_b) = slice_order(b);
        base_a.cmp(base_b).then(start_a.cmp(&start_b))
    });
    Ok(ordered)
}

/// Report shapes and positive-label counts for every slice pair of a
/// subject, in window order.
pub fn inspect_slices(slices_dir: &Path, subject: &str) -> EegResult<Vec<SliceReport>> {
    let subject_dir = slices_dir.join(subject);
    let mut reports = Vec::new();
    for (key, pair) in paired_slices(&subject_dir)? {
        let (x_path, y_path) = match pair {
            SlicePair::Complete { x, y } => (x, y),
            _ => {
                warn!(subject, key = key.as_str(), "missing companion array");
                continue;
            }
        };
        let x = NpyArray::read(&x_path)?;
        let y = NpyArray::read(&y_path)?;
        let positives = y
            .as_i8()
            .map(|l| l.iter().filter(|&&v| v == 1).count())
            .unwrap_or(0);
        reports.push(SliceReport {
            key,
            x_shape: x.shape.clone(),
            n_labels: y.len(),
            positives,
        });
    }
    Ok(reports)
}
