//! Multi-channel output accumulation.

/// Fixed-size accumulation buffer for the whole render. Channel count is
/// the maximum `output` arity across the program's perf functions; voices
/// add their samples into it in a fixed order so renders are bit-identical
/// run to run.
#[derive(Debug, Clone)]
pub struct OutputBus {
    channels: Vec<Vec<f32>>,
    len: usize,
}

impl OutputBus {
    pub fn new(channels: usize, len: usize) -> Self {
        Self {
            channels: vec![vec![0.0; len]; channels.max(1)],
            len,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mix one sample into a channel. Out-of-range positions are dropped;
    /// event scheduling already clamps voices to the render span.
    pub fn add(&mut self, channel: usize, pos: usize, sample: f32) {
        if channel < self.channels.len() && pos < self.len {
            self.channels[channel][pos] += sample;
        }
    }

    pub fn channel(&self, idx: usize) -> &[f32] {
        &self.channels[idx]
    }

    /// Frame-interleaved copy of all channels, the layout WAV writers want.
    pub fn interleaved(&self) -> Vec<f32> {
        let n = self.channels.len();
        let mut out = vec![0.0; self.len * n];
        for (ch, buf) in self.channels.iter().enumerate() {
            for (i, &s) in buf.iter().enumerate() {
                out[i * n + ch] = s;
            }
        }
        out
    }
}
