//! WAV sample playback (`WavPlayer`) — stereo decoding and a per-render cache.

use std::collections::HashMap;
use std::sync::Arc;

/// A decoded stereo sample. Mono files are duplicated to both channels;
/// files with more than two channels keep the first two.
#[derive(Debug, Clone)]
pub struct StereoSample {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoSample {
    /// Decode a WAV file from disk.
    ///
    /// Supports integer formats (normalized by 2^(bits-1)) and 32-bit float.
    pub fn load(path: &str) -> Result<Self, String> {
        let reader = hound::WavReader::open(path)
            .map_err(|e| format!("failed to open '{path}': {e}"))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|e| format!("failed to decode '{path}': {e}"))?
            }
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| format!("failed to decode '{path}': {e}"))?,
        };

        if interleaved.is_empty() {
            return Err(format!("'{path}' contains no samples"));
        }

        Ok(Self::from_interleaved(&interleaved, channels))
    }

    /// Split interleaved frames into a stereo pair.
    pub fn from_interleaved(interleaved: &[f32], channels: usize) -> Self {
        let channels = channels.max(1);
        let frames = interleaved.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in interleaved.chunks_exact(channels) {
            left.push(frame[0]);
            right.push(if channels > 1 { frame[1] } else { frame[0] });
        }
        Self { left, right }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }
}

/// Per-render cache of decoded samples, shared by all voices. The original
/// file is read and decoded once no matter how many call sites reference it.
#[derive(Default)]
pub struct SampleCache {
    samples: HashMap<String, Arc<StereoSample>>,
}

impl SampleCache {
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, path: &str) -> Result<Arc<StereoSample>, String> {
        if let Some(sample) = self.samples.get(path) {
            return Ok(Arc::clone(sample));
        }
        let sample = Arc::new(StereoSample::load(path)?);
        self.samples.insert(path.to_string(), Arc::clone(&sample));
        Ok(sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Playback position, one per call site per voice. Past the end of the file
/// the player emits silence.
#[derive(Debug, Clone, Default)]
pub struct WavState {
    pos: usize,
}

impl WavState {
    pub fn new() -> Self {
        Self { pos: 0 }
    }

    pub fn tick(&mut self, sample: &StereoSample) -> (f32, f32) {
        if self.pos >= sample.frames() {
            return (0.0, 0.0);
        }
        let frame = (sample.left[self.pos], sample.right[self.pos]);
        self.pos += 1;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &std::path::Path, channels: u16, frames: &[f32]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn mono_duplicates_to_both_channels() {
        let s = StereoSample::from_interleaved(&[0.1, 0.2, 0.3], 1);
        assert_eq!(s.left, vec![0.1, 0.2, 0.3]);
        assert_eq!(s.right, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn stereo_splits_channels() {
        let s = StereoSample::from_interleaved(&[0.1, -0.1, 0.2, -0.2], 2);
        assert_eq!(s.left, vec![0.1, 0.2]);
        assert_eq!(s.right, vec![-0.1, -0.2]);
    }

    #[test]
    fn playback_past_end_is_silent() {
        let s = StereoSample::from_interleaved(&[0.5, 0.5], 2);
        let mut state = WavState::new();
        assert_eq!(state.tick(&s), (0.5, 0.5));
        assert_eq!(state.tick(&s), (0.0, 0.0));
        assert_eq!(state.tick(&s), (0.0, 0.0));
    }

    #[test]
    fn load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wav");
        write_test_wav(&path, 2, &[0.25, -0.25, 0.5, -0.5]);

        let s = StereoSample::load(path.to_str().unwrap()).unwrap();
        assert_eq!(s.frames(), 2);
        assert!((s.left[0] - 0.25).abs() < 1e-6);
        assert!((s.right[0] + 0.25).abs() < 1e-6);
    }

    #[test]
    fn load_missing_file_is_error() {
        let err = StereoSample::load("/nonexistent/missing.wav").unwrap_err();
        assert!(err.contains("missing.wav"));
    }

    #[test]
    fn cache_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cached.wav");
        write_test_wav(&path, 1, &[0.1, 0.2]);

        let mut cache = SampleCache::new();
        let a = cache.get_or_load(path.to_str().unwrap()).unwrap();
        let b = cache.get_or_load(path.to_str().unwrap()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn independent_positions() {
        let s = StereoSample::from_interleaved(&[0.1, 0.2, 0.3], 1);
        let mut a = WavState::new();
        let mut b = WavState::new();
        a.tick(&s);
        a.tick(&s);
        // b has not advanced with a.
        assert_eq!(b.tick(&s), (0.1, 0.1));
    }
}
