//! ADSR envelope generators (`Adsr` control-rate, `Padsr` audio-rate).

/// Attack-Decay-Sustain-Release parameters for one envelope call.
///
/// All time values are in seconds. `sustain` is a level (0.0–1.0). `total`
/// is the envelope's full span including the release tail, so the sustain
/// phase ends at `total - release`.
#[derive(Debug, Clone, Copy)]
pub struct AdsrEnvelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub total: f32,
}

impl AdsrEnvelope {
    /// Amplitude at time `t` seconds.
    ///
    /// - During `[0, attack)`: linear ramp from 0 to 1.
    /// - During `[attack, attack+decay)`: linear ramp from 1 to sustain.
    /// - During `[attack+decay, total-release)`: sustain level.
    /// - During `[total-release, total)`: linear ramp from sustain to 0.
    /// - After `total`: 0.
    pub fn amplitude(&self, t: f32) -> f32 {
        if t < 0.0 {
            return 0.0;
        }
        let release_start = self.total - self.release;

        if t < self.attack {
            if self.attack <= 0.0 {
                1.0
            } else {
                t / self.attack
            }
        } else if t < self.attack + self.decay {
            if self.decay <= 0.0 {
                self.sustain
            } else {
                let decay_t = (t - self.attack) / self.decay;
                1.0 - decay_t * (1.0 - self.sustain)
            }
        } else if t < release_start {
            self.sustain
        } else if t < self.total {
            if self.release <= 0.0 {
                0.0
            } else {
                let release_t = (t - release_start) / self.release;
                self.sustain * (1.0 - release_t)
            }
        } else {
            0.0
        }
    }
}

/// Envelope clock state, one per call site per voice. Advances one sample
/// per tick regardless of whether the caller treats the result as control
/// or audio rate.
#[derive(Debug, Clone, Default)]
pub struct EnvState {
    clock: u64,
}

impl EnvState {
    pub fn new() -> Self {
        Self { clock: 0 }
    }

    pub fn tick(&mut self, env: &AdsrEnvelope, sample_rate: f32) -> f32 {
        let t = self.clock as f32 / sample_rate;
        self.clock += 1;
        env.amplitude(t)
    }
}
