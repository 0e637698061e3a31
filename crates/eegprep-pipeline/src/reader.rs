//! File-backed recording reader
//!
//! Recordings on disk are `.npy` arrays shaped `[channels, samples]`
//! (`<f4`, C order) with a JSON sidecar carrying the sampling rate.
//! Only the requested range is read per call, which is what keeps the
//! windowing engine's memory bounded to one chunk.

use crate::npy::{read_header, NpyHeader};
use eegprep_core::{EegError, EegResult, RecordingReader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Sidecar metadata stored next to each recording as `<base>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSidecar {
    pub sample_rate: f32,
}

/// Lazy reader over an on-disk `.npy` recording.
pub struct NpyRecording {
    id: String,
    file: File,
    channels: usize,
    samples: usize,
    sample_rate: f32,
    data_start: u64,
}

impl NpyRecording {
    /// Open `<base>.npy` plus its `<base>.json` sidecar.
    pub fn open(path: &Path) -> EegResult<Self> {
        let unreadable = |reason: String| EegError::UnreadableSource {
            path: path.display().to_string(),
            reason,
        };

        let mut file = File::open(path).map_err(|e| unreadable(e.to_string()))?;

        // The v1 header never exceeds 10 bytes + u16 length; one page is
        // plenty to parse it from.
        let mut prefix = vec![0u8; 4096];
        let read = read_up_to(&mut file, &mut prefix).map_err(|e| unreadable(e.to_string()))?;
        prefix.truncate(read);
        let NpyHeader {
            shape,
            descr,
            data_start,
        } = read_header(&prefix).map_err(|e| unreadable(e.to_string()))?;

        if descr != "<f4" {
            return Err(unreadable(format!("recording dtype '{}' is not <f4", descr)));
        }
        if shape.len() != 2 {
            return Err(unreadable(format!(
                "recording must be [channels, samples], got {} dims",
                shape.len()
            )));
        }

        let sidecar_path = path.with_extension("json");
        let sidecar_text = std::fs::read_to_string(&sidecar_path).map_err(|e| {
            EegError::UnreadableSource {
                path: sidecar_path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let sidecar: RecordingSidecar =
            serde_json::from_str(&sidecar_text).map_err(|e| EegError::UnreadableSource {
                path: sidecar_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("recording")
            .to_string();

        Ok(Self {
            id,
            file,
            channels: shape[0],
            samples: shape[1],
            sample_rate: sidecar.sample_rate,
            data_start: data_start as u64,
        })
    }
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

impl RecordingReader for NpyRecording {
    fn id(&self) -> &str {
        &self.id
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn sample_count(&self) -> usize {
        self.samples
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn read_range(&mut self, start: usize, stop: usize) -> EegResult<Vec<Vec<f32>>> {
        if start > stop || stop > self.samples {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "range [{}, {}) out of bounds for {} samples",
                    start, stop, self.samples
                ),
            });
        }

        let n = stop - start;
        let mut channels = Vec::with_capacity(self.channels);
        let mut raw = vec![0u8; n * 4];
        for ch in 0..self.channels {
            let offset = self.data_start + ((ch * self.samples + start) * 4) as u64;
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(&mut raw)?;
            channels.push(
                raw.chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            );
        }
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npy::NpyArray;

    fn write_recording(dir: &Path, base: &str, channels: usize, samples: usize, rate: f32) {
        let data: Vec<f32> = (0..channels * samples).map(|i| i as f32).collect();
        NpyArray::f32(vec![channels, samples], data)
            .unwrap()
            .write(&dir.join(format!("{}.npy", base)))
            .unwrap();
        let sidecar = serde_json::to_string(&RecordingSidecar { sample_rate: rate }).unwrap();
        std::fs::write(dir.join(format!("{}.json", base)), sidecar).unwrap();
    }

    #[test]
    fn test_open_and_read_range() {
        let dir = tempfile::tempdir().unwrap();
        write_recording(dir.path(), "chb01_03", 3, 100, 256.0);

        let mut rec = NpyRecording::open(&dir.path().join("chb01_03.npy")).unwrap();
        assert_eq!(rec.id(), "chb01_03");
        assert_eq!(rec.channel_count(), 3);
        assert_eq!(rec.sample_count(), 100);
        assert_eq!(rec.sample_rate(), 256.0);

        let range = rec.read_range(10, 13).unwrap();
        assert_eq!(range[0], vec![10.0, 11.0, 12.0]);
        assert_eq!(range[1], vec![110.0, 111.0, 112.0]);
        assert_eq!(range[2], vec![210.0, 211.0, 212.0]);
    }

    #[test]
    fn test_missing_sidecar_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<f32> = vec![0.0; 20];
        NpyArray::f32(vec![2, 10], data)
            .unwrap()
            .write(&dir.path().join("lonely.npy"))
            .unwrap();

        let result = NpyRecording::open(&dir.path().join("lonely.npy"));
        assert!(matches!(result, Err(EegError::UnreadableSource { .. })));
    }

    #[test]
    fn test_wrong_rank_rejected() {
        let dir = tempfile::tempdir().unwrap();
        NpyArray::f32(vec![8], vec![0.0; 8])
            .unwrap()
            .write(&dir.path().join("flat.npy"))
            .unwrap();
        std::fs::write(dir.path().join("flat.json"), r#"{"sample_rate": 256.0}"#).unwrap();

        assert!(NpyRecording::open(&dir.path().join("flat.npy")).is_err());
    }

    #[test]
    fn test_out_of_bounds_range() {
        let dir = tempfile::tempdir().unwrap();
        write_recording(dir.path(), "rec", 1, 50, 128.0);
        let mut rec = NpyRecording::open(&dir.path().join("rec.npy")).unwrap();
        assert!(rec.read_range(40, 60).is_err());
    }
}
