//! Full pipeline run on a synthetic recording with hand-computed
//! expectations: windowing, slice persistence, feature assembly.

use eegprep_pipeline::dataset::{inspect_slices, save_batch, DatasetAssembler};
use eegprep_pipeline::npy::NpyArray;
use eegprep_pipeline::{PipelineConfig, WindowingEngine};
use eegprep_simulation::{EegSimulator, SimulationConfig};

fn test_config() -> PipelineConfig {
    PipelineConfig {
        canonical_channels: 2,
        chunk_windows: 6,
        ..PipelineConfig::default()
    }
}

#[test]
fn synthetic_recording_to_feature_dataset() {
    // 2-channel, 10-minute recording at 256 Hz with one seizure episode
    // at 100s-160s. With 15s windows: 40 windows total, episode covers
    // window indices 100/15=6 through 160/15=10, i.e. 5 positives.
    let mut simulator = EegSimulator::new(SimulationConfig {
        channel_count: 2,
        sample_rate: 256.0,
        duration_s: 600,
        seed: Some(7),
        ..SimulationConfig::default()
    });
    let (mut recording, intervals) = simulator.generate("sim_subj_01", &[(100, 160)]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let slices_dir = dir.path().join("processed");
    let features_dir = dir.path().join("features");

    let mut engine = WindowingEngine::new(test_config()).unwrap();
    let mut batch_sizes = Vec::new();
    engine
        .process(&mut recording, &intervals, |batch| {
            batch_sizes.push(batch.window_count());
            save_batch(&slices_dir, "sub01", &batch)
        })
        .unwrap();

    // 40 windows in chunks of 6: six full chunks plus a remainder of 4
    assert_eq!(batch_sizes, vec![6, 6, 6, 6, 6, 6, 4]);

    // Slice files carry the expected shapes and label counts
    let reports = inspect_slices(&slices_dir, "sub01").unwrap();
    assert_eq!(reports.len(), 7);
    for report in &reports {
        assert_eq!(report.x_shape[1], 2);
        assert_eq!(report.x_shape[2], 15 * 128);
        assert_eq!(report.x_shape[0], report.n_labels);
    }
    let total_positives: usize = reports.iter().map(|r| r.positives).sum();
    assert_eq!(total_positives, 5);

    // Assemble features for the subject
    let mut assembler = DatasetAssembler::new(test_config()).unwrap();
    let summary = assembler
        .assemble_subject(&slices_dir, "sub01", &features_dir)
        .unwrap()
        .expect("features should be produced");

    assert_eq!(summary.windows, 40);
    assert_eq!(summary.feature_len, 2 * 10);
    assert_eq!(summary.positives, 5);

    let x = NpyArray::read(&features_dir.join("sub01").join("X_features_sub01.npy")).unwrap();
    assert_eq!(x.shape, vec![40, 20]);
    assert!(x.as_f32().unwrap().iter().all(|v| v.is_finite()));

    let y = NpyArray::read(&features_dir.join("sub01").join("y_labels_sub01.npy")).unwrap();
    let labels = y.as_i8().unwrap();
    assert_eq!(labels.len(), 40);
    for (i, &label) in labels.iter().enumerate() {
        let expected = if (6..=10).contains(&i) { 1 } else { 0 };
        assert_eq!(label, expected, "window {}", i);
    }
}

#[test]
fn recording_with_too_few_channels_is_rejected_whole() {
    let mut simulator = EegSimulator::new(SimulationConfig {
        channel_count: 1,
        sample_rate: 256.0,
        duration_s: 60,
        seed: Some(7),
        ..SimulationConfig::default()
    });
    let (mut recording, _) = simulator.generate("thin", &[]).unwrap();

    let mut engine = WindowingEngine::new(test_config()).unwrap();
    let mut emitted = 0usize;
    let result = engine.process(&mut recording, &[], |_| {
        emitted += 1;
        Ok(())
    });

    assert!(result.is_err());
    // The file produces zero output, not a partial batch
    assert_eq!(emitted, 0);
}
