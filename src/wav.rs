//! WAV export for rendered audio.

use std::path::Path;

use crate::engine::OutputBus;

/// Write the bus as a 16-bit interleaved PCM WAV file. Samples are clamped
/// to [-1.0, 1.0] before quantization.
pub fn write_wav(path: &Path, bus: &OutputBus, sample_rate: u32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: bus.channel_count() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in bus.interleaved() {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_readable_file() {
        let mut bus = OutputBus::new(2, 4);
        bus.add(0, 0, 0.5);
        bus.add(1, 0, -0.5);
        bus.add(0, 3, 1.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &bus, 48000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(Result::unwrap).collect();
        assert_eq!(samples.len(), 8);
        assert_eq!(samples[0], (0.5 * i16::MAX as f32) as i16);
        assert_eq!(samples[1], (-0.5 * i16::MAX as f32) as i16);
        assert_eq!(samples[6], i16::MAX);
    }

    #[test]
    fn clipping_saturates() {
        let mut bus = OutputBus::new(1, 1);
        bus.add(0, 0, 2.5);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, &bus, 44100).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.into_samples().map(Result::unwrap).collect();
        assert_eq!(samples[0], i16::MAX);
    }
}
