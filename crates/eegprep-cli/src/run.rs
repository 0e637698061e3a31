//! Subject-tree driver for the preparation pipeline
//!
//! Iterates subjects and recordings sequentially; every failure is logged
//! and isolated to the file that caused it, so one bad recording never
//! takes down a multi-subject run.

use anyhow::Context;
use eegprep_core::{parse_summary, RecordingReader, SeizureInterval};
use eegprep_pipeline::dataset::{inspect_slices, save_batch, DatasetAssembler};
use eegprep_pipeline::npy::NpyArray;
use eegprep_pipeline::reader::RecordingSidecar;
use eegprep_pipeline::{NpyRecording, PipelineConfig, WindowingEngine};
use eegprep_simulation::{EegSimulator, SimulationConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load a pipeline config from JSON, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(PipelineConfig::from_json(&text)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Subjects to process: the explicit filter if given, otherwise every
/// sub-directory of `dir`, sorted.
fn discover_subjects(dir: &Path, filter: &[String]) -> anyhow::Result<Vec<String>> {
    if !filter.is_empty() {
        let mut subjects = filter.to_vec();
        subjects.sort();
        return Ok(subjects);
    }
    let mut subjects = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                subjects.push(name.to_string());
            }
        }
    }
    subjects.sort();
    Ok(subjects)
}

/// Recording files for one subject: every `.npy` that has a JSON sidecar.
fn recording_paths(subject_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(subject_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("npy")
            && path.with_extension("json").is_file()
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Window, label, normalize, and persist every recording of every subject.
pub fn preprocess(
    config: &PipelineConfig,
    data_dir: &Path,
    out_dir: &Path,
    filter: &[String],
) -> anyhow::Result<()> {
    let mut engine = WindowingEngine::new(config.clone())?;

    for subject in discover_subjects(data_dir, filter)? {
        let subject_dir = data_dir.join(&subject);
        let summary_path = subject_dir.join(format!("{}-summary.txt", subject));
        if !summary_path.is_file() {
            warn!(subject, "summary file not found, skipping subject");
            continue;
        }
        let intervals = match parse_summary(&summary_path) {
            Ok(intervals) => intervals,
            Err(e) => {
                warn!(subject, error = %e, "unparsable summary, skipping subject");
                continue;
            }
        };

        let paths = recording_paths(&subject_dir)?;
        info!(
            subject,
            recordings = paths.len(),
            seizure_records = intervals.len(),
            "preprocessing subject"
        );

        for path in paths {
            if let Err(e) = preprocess_recording(&mut engine, &path, &intervals, out_dir, &subject)
            {
                warn!(
                    subject,
                    recording = %path.display(),
                    error = %e,
                    "skipping recording"
                );
            }
        }
    }
    Ok(())
}

fn preprocess_recording(
    engine: &mut WindowingEngine,
    path: &Path,
    intervals: &[SeizureInterval],
    out_dir: &Path,
    subject: &str,
) -> anyhow::Result<()> {
    let mut recording = NpyRecording::open(path)?;
    info!(
        recording = recording.id(),
        channels = recording.channel_count(),
        samples = recording.sample_count(),
        rate = recording.sample_rate(),
        "windowing"
    );
    engine.process(&mut recording, intervals, |batch| {
        save_batch(out_dir, subject, &batch)
    })?;
    Ok(())
}

/// Assemble per-subject feature datasets from persisted slices.
pub fn extract_features(
    config: &PipelineConfig,
    slices_dir: &Path,
    out_dir: &Path,
    filter: &[String],
) -> anyhow::Result<()> {
    let mut assembler = DatasetAssembler::new(config.clone())?;

    for subject in discover_subjects(slices_dir, filter)? {
        match assembler.assemble_subject(slices_dir, &subject, out_dir) {
            Ok(Some(summary)) => {
                info!(
                    subject,
                    windows = summary.windows,
                    feature_len = summary.feature_len,
                    positives = summary.positives,
                    "features written"
                );
            }
            Ok(None) => {}
            Err(e) => {
                warn!(subject, error = %e, "skipping subject");
            }
        }
    }
    Ok(())
}

/// Print shapes and label counts for every persisted slice.
pub fn inspect(slices_dir: &Path, filter: &[String]) -> anyhow::Result<()> {
    for subject in discover_subjects(slices_dir, filter)? {
        println!("--- {} ---", subject);
        for report in inspect_slices(slices_dir, &subject)? {
            println!(
                "{}: X shape {:?}, {} labels, {} seizure windows",
                report.key, report.x_shape, report.n_labels, report.positives
            );
        }
    }
    Ok(())
}

/// Write a synthetic subject tree (recording, sidecar, summary) that the
/// preprocess command can consume directly.
pub fn synthesize_subject(
    out_dir: &Path,
    subject: &str,
    duration: u64,
    channels: usize,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut simulator = EegSimulator::new(SimulationConfig {
        channel_count: channels,
        duration_s: duration,
        seed,
        ..SimulationConfig::default()
    });

    let episode_start = duration / 4;
    let episode_end = (episode_start + 60).min(duration);
    let recording_id = format!("{}_01", subject);
    let (mut recording, intervals) =
        simulator.generate(&recording_id, &[(episode_start, episode_end)])?;

    let subject_dir = out_dir.join(subject);
    fs::create_dir_all(&subject_dir)?;

    let n = recording.sample_count();
    let channel_data = recording.read_range(0, n)?;
    let flat: Vec<f32> = channel_data.into_iter().flatten().collect();
    NpyArray::f32(vec![channels, n], flat)?
        .write(&subject_dir.join(format!("{}.npy", recording_id)))?;

    let sidecar = RecordingSidecar {
        sample_rate: recording.sample_rate(),
    };
    fs::write(
        subject_dir.join(format!("{}.json", recording_id)),
        serde_json::to_string_pretty(&sidecar)?,
    )?;

    let mut summary = String::new();
    for interval in &intervals {
        summary.push_str(&format!(
            "File Name: {}\nNumber of Seizures in File: 1\nSeizure Start Time: {} seconds\nSeizure End Time: {} seconds\n\n",
            interval.source_file, interval.start_s, interval.end_s
        ));
    }
    fs::write(
        subject_dir.join(format!("{}-summary.txt", subject)),
        summary,
    )?;

    info!(
        subject,
        recording = recording_id,
        episode_start,
        episode_end,
        "synthetic subject written"
    );
    Ok(())
}
