//! Oscillator primitives — waveform generation with a persistent phase.

use std::f64::consts::PI;

/// Available waveform shapes. The integer tags match the `Oscil` component's
/// third argument: 0=Sine, 1=Saw, 2=Square, 3=Triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            0 => Some(Waveform::Sine),
            1 => Some(Waveform::Saw),
            2 => Some(Waveform::Square),
            3 => Some(Waveform::Triangle),
            _ => None,
        }
    }
}

/// Generate a single sample for the given waveform at the specified phase.
///
/// `phase` is in the range [0.0, 1.0), representing one full cycle.
/// Returns a value in [-1.0, 1.0].
pub fn waveform_sample(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * 2.0 * PI).sin(),
        Waveform::Saw => 2.0 * phase - 1.0,
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
    }
}

/// Phase-accumulator oscillator state, one per call site per voice.
#[derive(Debug, Clone, Default)]
pub struct OscState {
    phase: f64,
}

impl OscState {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Produce one sample and advance the phase by `freq / sample_rate`.
    pub fn tick(&mut self, waveform: Waveform, amps: f32, freq: f32, sample_rate: f32) -> f32 {
        let out = waveform_sample(waveform, self.phase) as f32 * amps;
        self.phase += freq as f64 / sample_rate as f64;
        self.phase -= self.phase.floor();
        out
    }
}
